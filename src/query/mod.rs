//! Query job orchestration for td-glance.
//!
//! Owns the submit, poll and fetch pipeline and the cancellation handshake,
//! independent of how results are presented.

pub mod orchestrator;

pub use orchestrator::{CancelHandle, JobOrchestrator, QueryFuture};
