//! Integration tests for Duckboard.

pub mod catalog_test;
pub mod session_test;
pub mod state_test;
