//! Query and result types exchanged with a partition store.

use ledgerstate_types::TxId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A JSON-store selector: field name to predicate.
pub type Selector = serde_json::Map<String, Value>;

/// Rows to fetch from one partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionQuery {
    /// Only keys starting with this prefix are returned.
    pub key_prefix: String,
    /// When set, only these keys are returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<BTreeSet<String>>,
    /// Predicates every returned value must satisfy. Empty matches everything.
    #[serde(default)]
    pub selector: Selector,
}

impl PartitionQuery {
    /// Every row under `key_prefix`.
    pub fn prefixed(key_prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_keys(mut self, keys: BTreeSet<String>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Whether `key` passes the prefix and key-set constraints.
    pub fn admits_key(&self, key: &str) -> bool {
        key.starts_with(&self.key_prefix)
            && self.keys.as_ref().is_none_or(|keys| keys.contains(key))
    }
}

/// One row returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// One committed modification of a base key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    /// Commit time, milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
    pub tx_id: TxId,
    /// The value written. Empty for deletions.
    pub value: Vec<u8>,
    pub is_delete: bool,
}
