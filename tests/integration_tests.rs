//! Integration tests for Duckboard.
//!
//! Run with: `cargo test --test integration_tests`

mod integration;
