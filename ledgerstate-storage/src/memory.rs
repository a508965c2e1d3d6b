//! In-process partition store.

use crate::error::{StorageError, StorageResult};
use crate::query::{KeyModification, KeyValue, PartitionQuery};
use crate::selector;
use crate::store::PartitionStore;
use ledgerstate_types::{Partition, TxId};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type Rows = BTreeMap<String, Vec<u8>>;

/// A [`PartitionStore`] kept entirely in memory.
///
/// Base writes and deletes are appended to a per-key history with a fresh
/// transaction id and the wall-clock time. Collections keep no history.
///
/// `deny` makes every call scoped to a partition fail with
/// [`StorageError::AccessDenied`] until `allow` is called, which is how tests
/// model a participant outside a collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    base: Rows,
    collections: HashMap<String, Rows>,
    history: HashMap<String, Vec<KeyModification>>,
    base_denied: bool,
    denied: HashSet<String>,
}

impl Inner {
    fn check_access(&self, partition: Partition<'_>) -> StorageResult<()> {
        let denied = match partition {
            Partition::Base => self.base_denied,
            Partition::Collection(name) => self.denied.contains(name),
        };
        if denied {
            Err(StorageError::AccessDenied(partition.to_string()))
        } else {
            Ok(())
        }
    }

    fn rows(&self, partition: Partition<'_>) -> Option<&Rows> {
        match partition {
            Partition::Base => Some(&self.base),
            Partition::Collection(name) => self.collections.get(name),
        }
    }

    fn rows_mut(&mut self, partition: Partition<'_>) -> &mut Rows {
        match partition {
            Partition::Base => &mut self.base,
            Partition::Collection(name) => self.collections.entry(name.to_string()).or_default(),
        }
    }

    fn record_history(&mut self, key: &str, value: Vec<u8>, is_delete: bool) {
        self.history
            .entry(key.to_string())
            .or_default()
            .push(KeyModification {
                timestamp_millis: chrono::Utc::now().timestamp_millis(),
                tx_id: TxId::new(),
                value,
                is_delete,
            });
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call scoped to `partition` fail until [`allow`](Self::allow).
    pub fn deny(&self, partition: Partition<'_>) {
        let mut inner = self.write();
        match partition {
            Partition::Base => inner.base_denied = true,
            Partition::Collection(name) => {
                inner.denied.insert(name.to_string());
            }
        }
    }

    /// Lifts a previous [`deny`](Self::deny).
    pub fn allow(&self, partition: Partition<'_>) {
        let mut inner = self.write();
        match partition {
            Partition::Base => inner.base_denied = false,
            Partition::Collection(name) => {
                inner.denied.remove(name);
            }
        }
    }

    /// Keys currently stored in `partition`, sorted. Ignores access control.
    pub fn keys(&self, partition: Partition<'_>) -> Vec<String> {
        self.read()
            .rows(partition)
            .map(|rows| rows.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Names of the collections that have ever been written to.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().collections.keys().cloned().collect();
        names.sort();
        names
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartitionStore for MemoryStore {
    fn get(&self, partition: Partition<'_>, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let inner = self.read();
        inner.check_access(partition)?;
        Ok(inner.rows(partition).and_then(|rows| rows.get(key)).cloned())
    }

    fn put(&self, partition: Partition<'_>, key: &str, value: &[u8]) -> StorageResult<()> {
        let mut inner = self.write();
        inner.check_access(partition)?;
        inner.rows_mut(partition).insert(key.to_string(), value.to_vec());
        if partition.is_base() {
            inner.record_history(key, value.to_vec(), false);
        }
        Ok(())
    }

    fn delete(&self, partition: Partition<'_>, key: &str) -> StorageResult<()> {
        let mut inner = self.write();
        inner.check_access(partition)?;
        let removed = match partition {
            Partition::Base => inner.base.remove(key).is_some(),
            Partition::Collection(name) => inner
                .collections
                .get_mut(name)
                .is_some_and(|rows| rows.remove(key).is_some()),
        };
        if removed && partition.is_base() {
            inner.record_history(key, Vec::new(), true);
        }
        Ok(())
    }

    fn query(&self, partition: Partition<'_>, query: &PartitionQuery) -> StorageResult<Vec<KeyValue>> {
        let inner = self.read();
        inner.check_access(partition)?;
        let Some(rows) = inner.rows(partition) else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for (key, value) in rows.range(query.key_prefix.clone()..) {
            if !key.starts_with(&query.key_prefix) {
                break;
            }
            if !query.admits_key(key) {
                continue;
            }
            if !query.selector.is_empty() {
                let document: Value = serde_json::from_slice(value)?;
                if !selector::matches(&query.selector, &document) {
                    continue;
                }
            }
            out.push(KeyValue {
                key: key.clone(),
                value: value.clone(),
            });
        }

        debug!(
            partition = %partition,
            prefix = %query.key_prefix,
            rows = out.len(),
            "memory store query"
        );
        Ok(out)
    }

    fn history(&self, key: &str) -> StorageResult<Vec<KeyModification>> {
        let inner = self.read();
        inner.check_access(Partition::Base)?;
        Ok(inner.history.get(key).cloned().unwrap_or_default())
    }
}
