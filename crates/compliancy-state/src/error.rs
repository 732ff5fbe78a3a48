//! Error types for compliancy-state

use thiserror::Error;

/// Errors produced by the registration, deviation and snapshot stores.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store could not be read
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be decoded
    #[error("malformed store document: {0}")]
    Malformed(String),

    /// Backend-specific failure (HTTP, table storage, ...)
    #[error("storage backend error: {0}")]
    Backend(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Malformed(err.to_string())
    }
}
