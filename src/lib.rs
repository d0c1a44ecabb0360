//! td-glance - job-based query client for Treasure Data.
//!
//! Submits queries as remote jobs, polls them to completion, fetches and
//! reshapes their results, and exposes table metadata for a UI layer.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;

pub use adapter::QueryAdapter;
pub use error::{Result, TdError};
