//! Partition store interface for ledgerstate.
//!
//! The record store never talks to a ledger directly. Every read, write and
//! query goes through [`PartitionStore`], scoped to one [`Partition`]: the
//! shared base partition or a named restricted collection.
//!
//! [`MemoryStore`] is a complete in-process implementation. It keeps an
//! append-only history for base rows, evaluates a subset of JSON-store
//! selectors (see [`selector`]) and can deny access to single partitions to
//! stand in for a participant that is not a member of a collection.

mod error;
mod memory;
mod query;
pub mod selector;
mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use query::{KeyModification, KeyValue, PartitionQuery, Selector};
pub use store::PartitionStore;

pub use ledgerstate_types::{Partition, TxId};
