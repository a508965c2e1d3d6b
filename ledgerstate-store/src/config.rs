//! Record store configuration.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Configuration for a [`RecordStore`](crate::RecordStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix of every ledger key the store writes (`<namespace>:<key>`).
    pub namespace: String,
    /// A partition view is written only if its JSON encoding is longer than
    /// this many bytes. The default skips `{}`.
    pub empty_view_threshold: usize,
    /// Fail queries whose selector names a field no registered type declares.
    /// When false such fields are sent to the base partition.
    pub reject_unknown_selector_fields: bool,
    /// On update, delete the old row of a partition whose new view is empty.
    pub prune_empty_views_on_update: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "records".to_string(),
            empty_view_threshold: 2,
            reject_unknown_selector_fields: true,
            prune_empty_views_on_update: true,
        }
    }
}

impl StoreConfig {
    /// Parses a JSON configuration document. Missing keys take their defaults.
    pub fn from_json_str(text: &str) -> StoreResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// The ledger-key prefix shared by every row of this store.
    pub fn key_prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    pub(crate) fn validate(&self) -> StoreResult<()> {
        if self.namespace.is_empty() || self.namespace.contains(':') {
            return Err(StoreError::InvalidConfig(format!(
                "namespace {:?} must be non-empty and free of ':'",
                self.namespace
            )));
        }
        Ok(())
    }
}
