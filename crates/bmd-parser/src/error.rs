//! Error types for BMD decoding operations.

use thiserror::Error;

/// Result type for BMD decoder operations.
pub type BmdResult<T> = Result<T, BmdError>;

/// Error types for BMD decoding.
#[derive(Error, Debug)]
pub enum BmdError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed file contents or header fields
    #[error("Invalid BMD format: {0}")]
    InvalidFormat(String),

    /// Malformed query selection
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Requested catalog or result entry does not exist
    #[error("No such entry: {0}")]
    NotFound(String),
}
