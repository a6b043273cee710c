//! Custom error types for the common library
//!
//! This module defines the errors raised by the secret store and table store
//! backends, shared by both services.

use thiserror::Error;

/// Custom error type for secret and table store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested secret or row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A row with the same partition and row key already exists
    #[error("Row already exists: {partition_key}/{row_key}")]
    Conflict {
        partition_key: String,
        row_key: String,
    },

    /// The upstream call did not complete within the configured limit
    #[error("{operation} timed out after {limit_ms} ms")]
    Timeout {
        operation: &'static str,
        limit_ms: u64,
    },

    /// Error reported by Redis
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Transport error while talking to the key vault
    #[error("Key vault request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The key vault answered with an unexpected status code
    #[error("Key vault returned status {0}")]
    UpstreamStatus(u16),

    /// A stored entity could not be decoded
    #[error("Malformed entity: {0}")]
    Malformed(String),

    /// Configuration error
    #[error("Store configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Whether the error is a missing entry rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Whether the caller may retry later (the upstream was unreachable or slow).
    /// An upstream 4xx other than 408 or 429 means the request itself was
    /// refused and retrying will not help.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Timeout { .. } | StoreError::Redis(_) | StoreError::Http(_) => true,
            StoreError::UpstreamStatus(status) => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
