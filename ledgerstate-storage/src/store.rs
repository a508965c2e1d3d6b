//! The external store interface.

use crate::error::StorageResult;
use crate::query::{KeyModification, KeyValue, PartitionQuery};
use ledgerstate_types::Partition;

/// Key/value storage split into partitions.
///
/// Values are opaque bytes; the record store writes UTF-8 JSON objects and
/// relies on `query` understanding them. Keys are ledger keys
/// (`<namespace>:<record key>`). A missing key is `Ok(None)`, never an error.
///
/// Implementations decide who may see which partition. A caller without
/// access to a collection gets an error for every call scoped to it.
pub trait PartitionStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, partition: Partition<'_>, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn put(&self, partition: Partition<'_>, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&self, partition: Partition<'_>, key: &str) -> StorageResult<()>;

    /// Returns every row whose key satisfies the query's key constraints and
    /// whose JSON value satisfies its selector.
    fn query(&self, partition: Partition<'_>, query: &PartitionQuery) -> StorageResult<Vec<KeyValue>>;

    /// Every committed modification of a base key, oldest first.
    fn history(&self, key: &str) -> StorageResult<Vec<KeyModification>>;
}
