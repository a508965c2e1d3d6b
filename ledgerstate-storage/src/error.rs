//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by a partition store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The caller may not read or write this partition.
    #[error("access denied to partition {0}")]
    AccessDenied(String),

    /// The backing store failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored value is not valid JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
