//! Remote query engine access.
//!
//! Provides a trait-based interface to the engine's job API so the
//! orchestrator can run against the real service or an in-memory mock.

mod mock;
pub mod schema;
mod td;
mod types;

pub use mock::{MockCall, MockJobClient, MockOp};
pub use td::TdClient;
pub use types::{
    ColumnDef, EngineKind, JobDebug, JobId, JobInfo, JobState, KillAck, QueryResult, Row,
    SubmittedJob, TableDescriptor, TableEntry, TableSummary, Value, BASE_TABLE,
};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Creates a Treasure Data client for the given connection settings.
///
/// This is the central factory for engine clients.
pub fn connect(config: &ConnectionConfig) -> Result<Arc<dyn JobClient>> {
    let client = TdClient::new(config.api_key()?, config.endpoint_url()?)?;
    Ok(Arc::new(client))
}

/// Request/response operations of the engine's job API.
///
/// Implementations do not retry, poll or wait; that is the orchestrator's job.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Submits a query and returns the engine-assigned job id.
    async fn submit(&self, database: &str, query: &str, engine: EngineKind)
        -> Result<SubmittedJob>;

    /// Fetches the current status of a job.
    async fn status(&self, job_id: &JobId) -> Result<JobInfo>;

    /// Fetches the raw newline-delimited JSON result of a finished job.
    async fn fetch_result(&self, job_id: &JobId) -> Result<String>;

    /// Asks the engine to abandon a job. Does not wait for it to stop.
    async fn kill(&self, job_id: &JobId) -> Result<KillAck>;

    /// Lists the tables of a database.
    async fn list_tables(&self, database: &str) -> Result<Vec<TableEntry>>;
}
