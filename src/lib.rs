//! Duckboard - load tabular files into an analytical catalog and query them.
//!
//! This library exposes the core modules for use in integration tests.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod state;
pub mod tasks;
