//! Error types for the record store.

use ledgerstate_model::ModelError;
use ledgerstate_storage::StorageError;
use thiserror::Error;

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this key (or hash) exists.
    #[error("record not found: {0}")]
    NotFound(String),

    /// `add` was called for a key that is already present.
    #[error("record already exists: {0}")]
    DuplicateKey(String),

    /// Stored data contradicts the store's invariants.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// A record or row carries a type tag no registered type has.
    #[error("unsupported record type: {0}")]
    UnsupportedType(String),

    /// A selector names a field no registered type declares.
    #[error("unknown selector field: {0}")]
    UnknownField(String),

    /// Two registered types share a name.
    #[error("record type registered twice: {0}")]
    DuplicateType(String),

    /// The store configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serializing or rebuilding a record failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The base partition failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
