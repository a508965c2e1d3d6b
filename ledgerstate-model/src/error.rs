//! Error types for the record model.

use ledgerstate_rules::RuleSyntaxError;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while defining, serializing or rebuilding records.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A declared visibility rule is malformed.
    #[error(transparent)]
    Rule(#[from] RuleSyntaxError),

    /// A record type definition is inconsistent.
    #[error("invalid record type definition: {0}")]
    InvalidDefinition(String),

    /// The selected reconstruction path needs a field the merged views lack.
    #[error("missing required field `{field}` of type {field_type}")]
    MissingField { field: String, field_type: String },

    /// A field is present but cannot be read as its declared type.
    #[error("invalid value for field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    /// No conditional reconstruction path matches the contributing partitions.
    #[error("no reconstruction path of `{type_name}` matches partitions {partitions:?}")]
    NoReconstructionPath {
        type_name: String,
        partitions: Vec<String>,
    },

    /// Stored data carries a different type tag than the type rebuilding it.
    #[error("record type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    /// A recomputed content hash differs from the committed one.
    #[error("hash mismatch: committed {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },

    /// The stored key is not a valid record key.
    #[error(transparent)]
    InvalidKey(#[from] ledgerstate_types::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
