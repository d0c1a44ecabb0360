//! Mock job client for testing.
//!
//! Plays back a scripted sequence of job states and records every call so
//! tests can assert on ordering.

use super::types::{
    EngineKind, JobDebug, JobId, JobInfo, JobState, KillAck, SubmittedJob, TableEntry,
};
use super::JobClient;
use crate::error::{Result, TdError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// A call received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Submit {
        database: String,
        query: String,
        engine: EngineKind,
    },
    Status(JobId),
    FetchResult(JobId),
    Kill(JobId),
    ListTables(String),
}

/// Operation a mock can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    Submit,
    Status,
    FetchResult,
    Kill,
    ListTables,
}

#[derive(Debug)]
struct MockState {
    job_id: JobId,
    engine: EngineKind,
    statuses: VecDeque<JobState>,
    last: JobState,
    after_kill: Vec<JobState>,
    schema: Option<String>,
    result: String,
    debug: Option<JobDebug>,
    tables: Vec<TableEntry>,
    failure: Option<(MockOp, String)>,
    hold_fetch: bool,
    calls: Vec<MockCall>,
}

/// A job client that returns predefined job states and results.
///
/// Once the scripted states run out the last one repeats, so a terminal
/// state stays terminal. After `kill` the `after_kill` script takes over.
#[derive(Debug)]
pub struct MockJobClient {
    state: Mutex<MockState>,
    polled: Arc<Notify>,
    fetching: Arc<Notify>,
}

impl MockJobClient {
    /// Creates a mock whose job succeeds on the first poll with no rows.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                job_id: JobId::from("1"),
                engine: EngineKind::default(),
                statuses: VecDeque::new(),
                last: JobState::Success,
                after_kill: vec![JobState::Killed],
                schema: Some("[]".to_string()),
                result: String::new(),
                debug: None,
                tables: Vec::new(),
                failure: None,
                hold_fetch: false,
                calls: Vec::new(),
            }),
            polled: Arc::new(Notify::new()),
            fetching: Arc::new(Notify::new()),
        }
    }

    /// A small canned dataset for offline runs.
    pub fn sample() -> Self {
        Self::new()
            .with_statuses([JobState::Queued, JobState::Running, JobState::Success])
            .with_schema(r#"[["symbol","string"],["close","double"]]"#)
            .with_result("[\"AAPL\",189.5]\n[\"GOOG\",141.2]\n")
            .with_tables(vec![TableEntry {
                name: "nasdaq".to_string(),
                schema: Some(r#"[["symbol","string"],["close","double"]]"#.to_string()),
                count: 2,
            }])
    }

    /// Sets the job id returned by `submit`.
    pub fn with_job_id(self, job_id: impl Into<String>) -> Self {
        self.lock().job_id = JobId::new(job_id);
        self
    }

    /// Sets the states returned by successive `status` calls.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = JobState>) -> Self {
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.statuses = statuses.into_iter().collect();
            if let Some(last) = state.statuses.back() {
                state.last = *last;
            }
        }
        self
    }

    /// Sets the states returned after a `kill`.
    pub fn with_after_kill(self, statuses: impl IntoIterator<Item = JobState>) -> Self {
        self.lock().after_kill = statuses.into_iter().collect();
        self
    }

    /// Sets the JSON-encoded result schema reported once the job is done.
    pub fn with_schema(self, schema: impl Into<String>) -> Self {
        self.lock().schema = Some(schema.into());
        self
    }

    /// Sets the raw newline-delimited result payload.
    pub fn with_result(self, payload: impl Into<String>) -> Self {
        self.lock().result = payload.into();
        self
    }

    pub fn with_debug(self, debug: JobDebug) -> Self {
        self.lock().debug = Some(debug);
        self
    }

    pub fn with_tables(self, tables: Vec<TableEntry>) -> Self {
        self.lock().tables = tables;
        self
    }

    /// Makes one operation fail with a transport error.
    pub fn failing(self, op: MockOp, message: impl Into<String>) -> Self {
        self.lock().failure = Some((op, message.into()));
        self
    }

    /// Makes `fetch_result` never complete, like a stalled download.
    pub fn with_held_fetch(self) -> Self {
        self.lock().hold_fetch = true;
        self
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Number of kill requests received.
    pub fn kill_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::Kill(_)))
            .count()
    }

    /// Signalled on every `status` call; a permit is stored if nobody waits.
    pub fn polled(&self) -> Arc<Notify> {
        Arc::clone(&self.polled)
    }

    /// Signalled when `fetch_result` starts; a permit is stored if nobody waits.
    pub fn fetching(&self) -> Arc<Notify> {
        Arc::clone(&self.fetching)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: MockCall, op: MockOp) -> Result<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.calls.push(call);
        let failed = match &state.failure {
            Some((failing, message)) if *failing == op => Some(message.clone()),
            _ => None,
        };
        match failed {
            Some(message) => Err(TdError::transport(message)),
            None => Ok(state),
        }
    }
}

impl Default for MockJobClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobClient for MockJobClient {
    async fn submit(
        &self,
        database: &str,
        query: &str,
        engine: EngineKind,
    ) -> Result<SubmittedJob> {
        let call = MockCall::Submit {
            database: database.to_string(),
            query: query.to_string(),
            engine,
        };
        let mut state = self.record(call, MockOp::Submit)?;
        state.engine = engine;
        Ok(SubmittedJob {
            job_id: state.job_id.clone(),
            engine,
        })
    }

    async fn status(&self, job_id: &JobId) -> Result<JobInfo> {
        let result = {
            let mut guard = self.record(MockCall::Status(job_id.clone()), MockOp::Status)?;
            let state = &mut *guard;
            let status = state.statuses.pop_front().unwrap_or(state.last);
            let mut info = JobInfo::new(job_id.clone(), status);
            if !matches!(
                status,
                JobState::Queued | JobState::Booting | JobState::Running
            ) {
                if let Some(schema) = &state.schema {
                    info = info.with_result_schema(state.engine, schema.clone());
                }
            }
            if let Some(debug) = &state.debug {
                info = info.with_debug(debug.clone());
            }
            info
        };
        self.polled.notify_one();
        Ok(result)
    }

    async fn fetch_result(&self, job_id: &JobId) -> Result<String> {
        let (payload, hold) = {
            let state = self.record(MockCall::FetchResult(job_id.clone()), MockOp::FetchResult)?;
            (state.result.clone(), state.hold_fetch)
        };
        self.fetching.notify_one();
        if hold {
            std::future::pending::<()>().await;
        }
        Ok(payload)
    }

    async fn kill(&self, job_id: &JobId) -> Result<KillAck> {
        let mut guard = self.record(MockCall::Kill(job_id.clone()), MockOp::Kill)?;
        let state = &mut *guard;
        let former = state.statuses.front().copied().unwrap_or(state.last);
        state.statuses = state.after_kill.iter().copied().collect();
        if let Some(last) = state.after_kill.last() {
            state.last = *last;
        }
        Ok(KillAck {
            job_id: Some(job_id.clone()),
            former_status: Some(former.to_string()),
        })
    }

    async fn list_tables(&self, database: &str) -> Result<Vec<TableEntry>> {
        let state = self.record(MockCall::ListTables(database.to_string()), MockOp::ListTables)?;
        Ok(state.tables.clone())
    }
}
