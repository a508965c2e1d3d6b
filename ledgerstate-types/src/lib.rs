//! Core type definitions for ledgerstate.
//!
//! This crate defines the identifiers shared by every layer:
//! - [`RecordKey`]: ordered key parts joined with `:`
//! - [`Partition`]: the base partition or a named restricted collection
//! - [`TxId`]: transaction identifier attached to base history entries (UUID v7)

mod ids;
mod key;
mod partition;

pub use ids::TxId;
pub use key::RecordKey;
pub use partition::Partition;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid record key: {0}")]
    InvalidKey(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
