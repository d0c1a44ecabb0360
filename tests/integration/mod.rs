//! Integration test modules.

pub mod adapter_test;
pub mod job_lifecycle_test;
pub mod live_test;
