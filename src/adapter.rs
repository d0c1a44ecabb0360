//! Host-facing data source adapter for Treasure Data.
//!
//! Builds a fresh client per call, runs queries through the job
//! orchestrator, and reshapes results and table metadata for display.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ConnectionConfig, HiveResultPolicy, DEFAULT_POLL_INTERVAL_MS};
use crate::engine::{
    self, schema, EngineKind, JobClient, QueryResult, TableDescriptor, TableSummary, Value,
};
use crate::error::{Result, TdError};
use crate::query::{CancelHandle, JobOrchestrator, QueryFuture};

/// Builds a job client from connection settings.
pub type ClientFactory =
    Arc<dyn Fn(&ConnectionConfig) -> Result<Arc<dyn JobClient>> + Send + Sync>;

/// One declarative configuration field shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigField {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    pub placeholder: &'static str,
    pub required: bool,
}

const CONFIG_SCHEMA: &[ConfigField] = &[
    ConfigField {
        name: "api_key",
        label: "API Key",
        field_type: "string",
        placeholder: "your-api-key",
        required: true,
    },
    ConfigField {
        name: "engine",
        label: "QueryEngine",
        field_type: "string",
        placeholder: "presto or hive (default presto)",
        required: false,
    },
    ConfigField {
        name: "database",
        label: "Database",
        field_type: "string",
        placeholder: "target database",
        required: true,
    },
];

/// Treasure Data data source.
///
/// Holds at most one in-flight query; `execute` while another is running
/// fails with [`TdError::Busy`]. Use [`QueryAdapter::start`] for runs that
/// should not touch adapter state.
pub struct QueryAdapter {
    config: ConnectionConfig,
    factory: ClientFactory,
    poll_interval: Duration,
    in_flight: Mutex<Option<CancelHandle>>,
}

impl QueryAdapter {
    pub const KEY: &'static str = "treasuredata";
    pub const LABEL: &'static str = "TreasureData";

    /// Creates an adapter that talks to the real Treasure Data API.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_client_factory(config, Arc::new(engine::connect))
    }

    /// Creates an adapter with a custom client factory.
    pub fn with_client_factory(config: ConnectionConfig, factory: ClientFactory) -> Self {
        Self {
            config,
            factory,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            in_flight: Mutex::new(None),
        }
    }

    /// Sets the delay between two job status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Declarative configuration fields for the host's settings form.
    pub fn config_schema() -> &'static [ConfigField] {
        CONFIG_SCHEMA
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Starts a query and returns its cancel handle and eventual result.
    ///
    /// Nothing is stored on the adapter; the caller owns the handle.
    pub fn start(&self, query: &str) -> Result<(CancelHandle, QueryFuture)> {
        let database = self.config.database()?.to_string();
        let client = (self.factory)(&self.config)?;
        let engine = self.config.engine;
        let policy = self.config.hive_results;

        let orchestrator = JobOrchestrator::new(client, engine).with_poll_interval(self.poll_interval);
        let (handle, future) = orchestrator.start(database, query);
        let future = future
            .map(move |result| result.map(|r| apply_result_policy(engine, policy, r)))
            .boxed();

        Ok((handle, future))
    }

    /// Runs a query to completion, keeping its cancel handle for [`cancel`].
    ///
    /// [`cancel`]: QueryAdapter::cancel
    pub async fn execute(&self, query: &str) -> Result<QueryResult> {
        let (handle, future) = self.start(query)?;
        let _slot = self.claim(handle)?;
        future.await
    }

    /// Cancels the in-flight query, if any. Never fails.
    pub fn cancel(&self) {
        let handle = self.slot().as_ref().cloned();
        match handle {
            Some(handle) => handle.cancel(),
            None => debug!("Cancel requested with no query in flight"),
        }
    }

    /// Returns true while an `execute` call is outstanding.
    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    /// Always succeeds; no request is made.
    pub fn connection_test(&self) -> bool {
        true
    }

    /// Lists the tables of the configured database.
    pub async fn fetch_tables(&self) -> Result<Vec<TableDescriptor>> {
        let database = self.config.database()?;
        let client = (self.factory)(&self.config)?;
        let entries = client.list_tables(database).await?;
        debug!("Listed {} tables in {}", entries.len(), database);

        entries.into_iter().map(schema::table_descriptor).collect()
    }

    /// Column definitions of a table as a two-column result.
    pub fn fetch_table_summary(&self, table: &TableDescriptor) -> TableSummary {
        let rows = table
            .columns
            .iter()
            .map(|c| vec![Value::from(c.name.as_str()), Value::from(c.data_type.as_str())])
            .collect();

        TableSummary {
            name: table.name.clone(),
            defs: QueryResult::with_data(vec!["Field".to_string(), "Type".to_string()], rows),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancelHandle>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn claim(&self, handle: CancelHandle) -> Result<InFlightSlot<'_>> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(TdError::Busy);
        }
        *slot = Some(handle);
        Ok(InFlightSlot {
            slot: &self.in_flight,
        })
    }
}

impl std::fmt::Debug for QueryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryAdapter")
            .field("connection", &self.config.display_string())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Clears the adapter's in-flight handle when the execution ends or is dropped.
struct InFlightSlot<'a> {
    slot: &'a Mutex<Option<CancelHandle>>,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

fn apply_result_policy(
    engine: EngineKind,
    policy: HiveResultPolicy,
    result: QueryResult,
) -> QueryResult {
    match (engine, policy) {
        (EngineKind::Hive, HiveResultPolicy::Discard) => {
            warn!(
                "Discarding {} rows from Hive query; set hive_results = \"pass_through\" to keep them",
                result.row_count()
            );
            QueryResult::new()
        }
        _ => result,
    }
}
