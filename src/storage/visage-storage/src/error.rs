//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend connection or migration failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failure.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Invalid key or record data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
