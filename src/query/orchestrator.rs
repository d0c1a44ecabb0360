//! Job lifecycle: submit, poll until terminal, fetch, cancel.
//!
//! Polling is an explicit loop with a non-blocking sleep between status
//! checks. There is no attempt limit and no deadline, so a job that never
//! finishes keeps the caller waiting.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::DEFAULT_POLL_INTERVAL_MS;
use crate::engine::{schema, EngineKind, JobClient, JobId, JobInfo, JobState, QueryResult};
use crate::error::{Result, TdError};

/// Future resolving to the outcome of one job run.
pub type QueryFuture = BoxFuture<'static, Result<QueryResult>>;

/// Requests early termination of one job run.
///
/// Handed out before any I/O starts. A cancel issued before the job id is
/// known is remembered and acted on as soon as submission returns. Once the
/// run has resolved, cancelling does nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Never fails; repeated calls are harmless.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Drives a single job from submission to a terminal outcome.
#[derive(Clone)]
pub struct JobOrchestrator {
    client: Arc<dyn JobClient>,
    engine: EngineKind,
    poll_interval: Duration,
}

impl JobOrchestrator {
    pub fn new(client: Arc<dyn JobClient>, engine: EngineKind) -> Self {
        Self {
            client,
            engine,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Sets the delay between two status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Runs a query to completion without a way to cancel it.
    pub async fn run(&self, database: &str, query: &str) -> Result<QueryResult> {
        self.drive(database, query, CancellationToken::new()).await
    }

    /// Starts a cancellable run.
    ///
    /// The handle is returned before the future is first polled, so it can be
    /// stored or wired to a signal before any request goes out.
    pub fn start(
        &self,
        database: impl Into<String>,
        query: impl Into<String>,
    ) -> (CancelHandle, QueryFuture) {
        let handle = CancelHandle::new();
        let token = handle.token.clone();
        let this = self.clone();
        let database = database.into();
        let query = query.into();

        let future = async move { this.drive(&database, &query, token).await }.boxed();
        (handle, future)
    }

    async fn drive(
        &self,
        database: &str,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<QueryResult> {
        let job = self.client.submit(database, query, self.engine).await?;
        info!("Submitted {} job {} on {}", job.engine, job.job_id, database);

        let finished = tokio::select! {
            biased;

            _ = cancel.cancelled() => return self.abort(&job.job_id).await,
            info = self.wait_for_terminal(&job.job_id) => info?,
        };
        info!("Job {} finished with status {}", job.job_id, finished.status);

        // The job is already terminal here, so there is nothing left to kill.
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("Job {} canceled before its result was collected", job.job_id);
                Err(TdError::Canceled)
            }
            result = self.collect(&finished) => result,
        }
    }

    /// Polls until the job reports a terminal state.
    async fn wait_for_terminal(&self, job_id: &JobId) -> Result<JobInfo> {
        loop {
            let info = self.client.status(job_id).await?;
            if info.status.is_terminal() {
                return Ok(info);
            }
            debug!(
                "Job {} is {}, checking again in {:?}",
                job_id, info.status, self.poll_interval
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Kills the job and waits for it to stop. Always ends as canceled
    /// unless a remote call fails first.
    ///
    /// A transport error from the kill or from any poll after it is returned
    /// as-is, even once the kill was acknowledged: forwarding the first
    /// failure takes priority over reporting the cancel.
    async fn abort(&self, job_id: &JobId) -> Result<QueryResult> {
        info!("Canceling job {}", job_id);
        let ack = self.client.kill(job_id).await?;
        debug!(
            "Kill of job {} acknowledged (former status: {})",
            job_id,
            ack.former_status.as_deref().unwrap_or("unknown")
        );

        let stopped = self.wait_for_terminal(job_id).await?;
        info!("Job {} stopped with status {} after cancel", job_id, stopped.status);
        Err(TdError::Canceled)
    }

    /// Turns a terminal job into its result or its error.
    async fn collect(&self, info: &JobInfo) -> Result<QueryResult> {
        match info.status {
            JobState::Success => {
                let raw_schema = info.result_schema(self.engine).ok_or_else(|| {
                    TdError::parse(format!(
                        "job {} succeeded without a result schema",
                        info.job_id
                    ))
                })?;
                let fields = schema::parse_field_names(raw_schema)?;

                let payload = self.client.fetch_result(&info.job_id).await?;
                let rows = schema::parse_rows(&payload)?;
                debug!("Job {} returned {} rows", info.job_id, rows.len());

                Ok(QueryResult::with_data(fields, rows))
            }
            JobState::Error | JobState::Killed => Err(TdError::engine(info.error_detail())),
            other => Err(TdError::internal(format!(
                "job {} collected in non-terminal state {}",
                info.job_id, other
            ))),
        }
    }
}
