//! Integration tests for td-glance.
//!
//! Most tests drive the public API against the in-memory mock engine.
//! The live tests require TD_API_KEY and TD_DATABASE and skip otherwise.
//!
//! Run with: `cargo test --test integration_tests`

mod integration;
