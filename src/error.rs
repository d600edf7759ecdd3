//! Error types for Duckboard.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for Duckboard operations.
#[derive(Error, Debug)]
pub enum DuckboardError {
    /// Source suffix or export format name outside the supported set.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Read/parse failure on a data source (malformed file, unreachable URL).
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Engine-reported SQL failure, carrying the engine diagnostic.
    #[error("Query error: {0}")]
    Query(String),

    /// Schema or stats lookup on a name that was never registered.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A forward-only result handle was read a second time.
    #[error("Result already consumed")]
    AlreadyConsumed,

    /// Underlying persistence failure in the state store.
    #[error("State store error: {0}")]
    StateStore(String),

    /// Configuration errors (invalid config file, bad CLI values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A task submission was rejected because one is already in flight.
    #[error("Busy: {0}")]
    Busy(String),

    /// Operation on a catalog store after `close()`.
    #[error("Catalog store is closed")]
    Closed,

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DuckboardError {
    /// Creates an unsupported-format error with the given message.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Creates an ingestion error with the given message.
    pub fn ingestion(msg: impl Into<String>) -> Self {
        Self::Ingestion(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an unknown-table error for the given table name.
    pub fn unknown_table(name: impl Into<String>) -> Self {
        Self::UnknownTable(name.into())
    }

    /// Creates a state store error with the given message.
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a busy error with the given message.
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "Unsupported Format",
            Self::Ingestion(_) => "Ingestion Error",
            Self::Query(_) => "Query Error",
            Self::UnknownTable(_) => "Unknown Table",
            Self::AlreadyConsumed => "Result Consumed",
            Self::StateStore(_) => "State Store Error",
            Self::Config(_) => "Configuration Error",
            Self::Busy(_) => "Busy",
            Self::Closed => "Catalog Closed",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using DuckboardError.
pub type Result<T> = std::result::Result<T, DuckboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unsupported_format() {
        let err = DuckboardError::unsupported_format(".xlsx");
        assert_eq!(err.to_string(), "Unsupported format: .xlsx");
        assert_eq!(err.category(), "Unsupported Format");
    }

    #[test]
    fn test_error_display_ingestion() {
        let err = DuckboardError::ingestion("could not open data.csv");
        assert_eq!(err.to_string(), "Ingestion error: could not open data.csv");
        assert_eq!(err.category(), "Ingestion Error");
    }

    #[test]
    fn test_error_display_query() {
        let err = DuckboardError::query("Binder Error: column \"emal\" not found");
        assert_eq!(
            err.to_string(),
            "Query error: Binder Error: column \"emal\" not found"
        );
        assert_eq!(err.category(), "Query Error");
    }

    #[test]
    fn test_error_display_unknown_table() {
        let err = DuckboardError::unknown_table("sales");
        assert_eq!(err.to_string(), "Unknown table: sales");
        assert_eq!(err.category(), "Unknown Table");
    }

    #[test]
    fn test_error_display_already_consumed() {
        let err = DuckboardError::AlreadyConsumed;
        assert_eq!(err.to_string(), "Result already consumed");
        assert_eq!(err.category(), "Result Consumed");
    }

    #[test]
    fn test_error_display_state_store() {
        let err = DuckboardError::state_store("disk I/O error");
        assert_eq!(err.to_string(), "State store error: disk I/O error");
        assert_eq!(err.category(), "State Store Error");
    }

    #[test]
    fn test_error_display_closed() {
        let err = DuckboardError::Closed;
        assert_eq!(err.to_string(), "Catalog store is closed");
        assert_eq!(err.category(), "Catalog Closed");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DuckboardError>();
    }
}
