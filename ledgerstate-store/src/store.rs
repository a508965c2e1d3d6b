//! The record store façade.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::query::{decode_view, QueryPlan};
use crate::router::RoutingTable;
use ledgerstate_model::serializer::{self, from_views, to_partition_view};
use ledgerstate_model::{FieldMap, Record, RecordKey, RecordType, HASH_FIELD, TYPE_FIELD};
use ledgerstate_storage::{Partition, PartitionQuery, PartitionStore, Selector, TxId};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One committed version of a record, rebuilt from the base partition only.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<R> {
    pub timestamp_millis: i64,
    pub tx_id: TxId,
    pub record: R,
}

/// Typed CRUD and queries over records split across partitions.
///
/// One store serves one Rust record type `R`; several [`RecordType`]s can be
/// registered for it, e.g. when `R` is an enum. All state lives in the
/// partition store, so every call sees the latest committed data.
pub struct RecordStore<R> {
    store: Arc<dyn PartitionStore>,
    config: StoreConfig,
    types: Vec<Arc<RecordType<R>>>,
    routing: RoutingTable,
}

/// Builder for [`RecordStore`]; registers record types and builds the
/// routing table.
pub struct RecordStoreBuilder<R> {
    store: Arc<dyn PartitionStore>,
    config: StoreConfig,
    types: Vec<Arc<RecordType<R>>>,
}

impl<R> RecordStoreBuilder<R> {
    pub fn register(mut self, record_type: Arc<RecordType<R>>) -> Self {
        self.types.push(record_type);
        self
    }

    pub fn build(self) -> StoreResult<RecordStore<R>> {
        self.config.validate()?;

        let mut routing = RoutingTable::default();
        for record_type in &self.types {
            routing.register(record_type.as_ref())?;
        }

        info!(
            namespace = %self.config.namespace,
            types = ?routing.type_names().collect::<Vec<_>>(),
            partitions = ?routing.partitions(),
            "record store ready"
        );
        Ok(RecordStore {
            store: self.store,
            config: self.config,
            types: self.types,
            routing,
        })
    }
}

impl<R> RecordStore<R> {
    pub fn builder(store: Arc<dyn PartitionStore>, config: StoreConfig) -> RecordStoreBuilder<R> {
        RecordStoreBuilder {
            store,
            config,
            types: Vec::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Every partition any registered type can write to.
    pub fn partitions(&self) -> &[String] {
        self.routing.partitions()
    }

    pub fn record_type(&self, name: &str) -> Option<&RecordType<R>> {
        self.types.iter().find(|t| t.name() == name).map(|t| &**t)
    }

    /// Splits a selector into per-partition queries without running it.
    pub fn plan(&self, selector: &Selector) -> StoreResult<QueryPlan> {
        QueryPlan::new(selector, &self.routing, self.config.reject_unknown_selector_fields)
    }

    /// Whether a base row exists for `key`.
    pub fn exists(&self, key: &RecordKey) -> StoreResult<bool> {
        Ok(self.store.get(Partition::Base, &self.ledger_key(key))?.is_some())
    }

    /// Number of records in the store's namespace.
    pub fn count(&self) -> StoreResult<usize> {
        let query = PartitionQuery::prefixed(self.config.key_prefix());
        Ok(self.store.query(Partition::Base, &query)?.len())
    }

    fn ledger_key(&self, key: &RecordKey) -> String {
        key.ledger_key(&self.config.namespace)
    }

    fn registered(&self, type_name: &str) -> StoreResult<&RecordType<R>> {
        self.record_type(type_name)
            .ok_or_else(|| StoreError::UnsupportedType(type_name.to_string()))
    }

    fn type_of_row(&self, base: &FieldMap) -> StoreResult<&RecordType<R>> {
        let type_name = base
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Integrity("base row has no type tag".into()))?;
        self.registered(type_name)
    }

    fn partitions_of(&self, record_type: &RecordType<R>) -> &[String] {
        self.routing.partitions_of(record_type.name()).unwrap_or_default()
    }
}

impl<R: Record> RecordStore<R> {
    /// Stores a new record. Fails with `DuplicateKey` if the key is taken.
    pub fn add(&self, record: &R) -> StoreResult<()> {
        let record_type = self.registered(record.type_name())?;
        let ledger_key = self.ledger_key(record.key());
        if self.store.get(Partition::Base, &ledger_key)?.is_some() {
            return Err(StoreError::DuplicateKey(record.key().to_string()));
        }
        self.write(record_type, record, &ledger_key, false)?;
        info!(key = %record.key(), record_type = record_type.name(), "record added");
        Ok(())
    }

    /// Overwrites a record. Without `force` the record must already exist.
    pub fn update(&self, record: &R, force: bool) -> StoreResult<()> {
        let record_type = self.registered(record.type_name())?;
        let ledger_key = self.ledger_key(record.key());
        if !force && self.store.get(Partition::Base, &ledger_key)?.is_none() {
            return Err(StoreError::NotFound(record.key().to_string()));
        }
        self.write(
            record_type,
            record,
            &ledger_key,
            self.config.prune_empty_views_on_update,
        )?;
        info!(key = %record.key(), force, "record updated");
        Ok(())
    }

    fn write(&self, record_type: &RecordType<R>, record: &R, ledger_key: &str, prune: bool) -> StoreResult<()> {
        if !record.header().is_sealed() {
            return Err(StoreError::Integrity(format!(
                "record {} has no content hash",
                record.key()
            )));
        }
        serializer::validate(record_type, record)?;

        let base = to_partition_view(record_type, record, None, false);
        self.store
            .put(Partition::Base, ledger_key, &serde_json::to_vec(&base)?)?;

        for partition in self.partitions_of(record_type) {
            let view = to_partition_view(record_type, record, Some(partition.as_str()), false);
            let bytes = serde_json::to_vec(&view)?;
            let target = Partition::Collection(partition);
            let outcome = if bytes.len() > self.config.empty_view_threshold {
                self.store.put(target, ledger_key, &bytes)
            } else if prune {
                self.store.delete(target, ledger_key)
            } else {
                debug!(partition = %partition, key = %ledger_key, "empty view not written");
                continue;
            };
            if let Err(e) = outcome {
                warn!(partition = %partition, key = %ledger_key, error = %e, "partition write failed, skipping");
            }
        }
        Ok(())
    }

    /// Reads a record, or `None` if no base row exists.
    ///
    /// Partitions that fail or hold no row for the key are left out; the
    /// record is rebuilt from whatever could be read.
    pub fn find(&self, key: &RecordKey) -> StoreResult<Option<R>> {
        let ledger_key = self.ledger_key(key);
        let Some(bytes) = self.store.get(Partition::Base, &ledger_key)? else {
            return Ok(None);
        };
        let base = decode_view(&bytes)?;
        let record_type = self.type_of_row(&base)?;

        let mut views: Vec<(&str, FieldMap)> = Vec::new();
        for partition in self.partitions_of(record_type) {
            match self.store.get(Partition::Collection(partition), &ledger_key) {
                Ok(Some(bytes)) => match decode_view(&bytes) {
                    Ok(view) if view.is_empty() => {}
                    Ok(view) => views.push((partition.as_str(), view)),
                    Err(e) => {
                        warn!(partition = %partition, key = %ledger_key, error = %e, "unreadable partition row, skipping");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    warn!(partition = %partition, key = %ledger_key, error = %e, "partition read failed, skipping");
                }
            }
        }

        Ok(Some(from_views(record_type, base, &views)?))
    }

    /// Reads a record. Fails with `NotFound` if no base row exists.
    pub fn get(&self, key: &RecordKey) -> StoreResult<R> {
        self.find(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Reads the record whose content hash is `hash`.
    pub fn get_by_hash(&self, hash: &str) -> StoreResult<R> {
        let mut selector = Selector::new();
        selector.insert(HASH_FIELD.to_string(), Value::String(hash.to_string()));
        let query = PartitionQuery::prefixed(self.config.key_prefix()).with_selector(selector);
        let rows = self.store.query(Partition::Base, &query)?;

        match rows.as_slice() {
            [] => Err(StoreError::NotFound(hash.to_string())),
            [row] => {
                let key = RecordKey::from_ledger_key(&self.config.namespace, &row.key)
                    .ok_or_else(|| StoreError::Integrity(format!("malformed ledger key {}", row.key)))?;
                self.get(&key)
            }
            _ => Err(StoreError::Integrity(format!(
                "{} records share hash {hash}",
                rows.len()
            ))),
        }
    }

    /// Every committed version of a record, oldest first, public fields only.
    /// Deletions are skipped.
    pub fn get_history(&self, key: &RecordKey) -> StoreResult<Vec<HistoryEntry<R>>> {
        let mut out = Vec::new();
        for modification in self.store.history(&self.ledger_key(key))? {
            if modification.is_delete {
                continue;
            }
            let base = decode_view(&modification.value)?;
            let record_type = self.type_of_row(&base)?;
            out.push(HistoryEntry {
                timestamp_millis: modification.timestamp_millis,
                tx_id: modification.tx_id,
                record: from_views::<R, &str>(record_type, base, &[])?,
            });
        }
        Ok(out)
    }

    /// Records matching `selector`, sorted by key.
    pub fn query(&self, selector: &Selector) -> StoreResult<Vec<R>> {
        let plan = self.plan(selector)?;
        let rows = plan.execute(self.store.as_ref(), &self.config.key_prefix())?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let record_type = self.type_of_row(&row.base)?;
            debug!(key = %row.ledger_key, partitions = row.views.len(), "rebuilding query result");
            out.push(from_views(record_type, row.base, &row.views)?);
        }
        Ok(out)
    }

    /// Every record in the store's namespace, sorted by key.
    pub fn get_all(&self) -> StoreResult<Vec<R>> {
        self.query(&Selector::new())
    }

    /// Removes a record from the base partition and every partition of its
    /// type. Returns the record as it could be read before removal, or `None`
    /// if it did not exist.
    pub fn delete(&self, key: &RecordKey) -> StoreResult<Option<R>> {
        let Some(record) = self.find(key)? else {
            return Ok(None);
        };
        let record_type = self.registered(record.type_name())?;
        let ledger_key = self.ledger_key(key);

        self.store.delete(Partition::Base, &ledger_key)?;
        for partition in self.partitions_of(record_type) {
            if let Err(e) = self.store.delete(Partition::Collection(partition), &ledger_key) {
                warn!(partition = %partition, key = %ledger_key, error = %e, "partition delete failed, skipping");
            }
        }
        info!(key = %key, "record deleted");
        Ok(Some(record))
    }

    /// Checks disclosed field values against the hash committed in the base row.
    ///
    /// `disclosed` must hold every declared field of the record, restricted
    /// ones included, exactly as they were when the record was sealed.
    pub fn verify_disclosure(&self, key: &RecordKey, disclosed: &FieldMap) -> StoreResult<()> {
        let bytes = self
            .store
            .get(Partition::Base, &self.ledger_key(key))?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let base = decode_view(&bytes)?;
        let record_type = self.type_of_row(&base)?;
        let committed = base
            .get(HASH_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Integrity(format!("base row of {key} has no hash")))?;

        serializer::verify_disclosure(record_type, key, disclosed, committed)?;
        Ok(())
    }
}

impl<R> fmt::Debug for RecordStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("config", &self.config)
            .field("routing", &self.routing)
            .finish_non_exhaustive()
    }
}
