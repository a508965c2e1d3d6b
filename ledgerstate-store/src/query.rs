//! Cross-partition query planning and result merging.
//!
//! A selector is planned once per registered record type, since the same
//! field name can carry a different rule in each type. Within a type's plan,
//! predicates on public and header fields go to the base query. Predicates on
//! restricted fields go to every partition the field's rule names, and those
//! partitions become *required*. The base query runs first and decides the
//! candidate keys of that type. Each of the type's partitions is then queried
//! for those keys only. A key qualifies when every required partition matched
//! it. The results of all types are combined.

use crate::error::{StoreError, StoreResult};
use crate::router::{FieldRoute, RoutingTable};
use ledgerstate_model::{FieldMap, TYPE_FIELD};
use ledgerstate_storage::{KeyValue, Partition, PartitionQuery, PartitionStore, Selector};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// A selector split into per-partition queries, one [`TypePlan`] per
/// registered record type.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    types: Vec<TypePlan>,
}

/// The queries that find the records of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypePlan {
    type_name: String,
    base: Selector,
    partitions: Vec<(String, Selector)>,
    required: BTreeSet<String>,
}

/// Views gathered for one base row, partition views in partition order.
#[derive(Debug)]
pub(crate) struct MergedRow {
    pub(crate) ledger_key: String,
    pub(crate) base: FieldMap,
    pub(crate) views: Vec<(String, FieldMap)>,
}

impl QueryPlan {
    /// Routes every predicate of `selector` for each registered type.
    ///
    /// A field no registered type declares fails with `UnknownField` when
    /// `reject_unknown` is set. Otherwise, like a field declared only by
    /// other types, it is matched against the base row.
    pub fn new(selector: &Selector, routing: &RoutingTable, reject_unknown: bool) -> StoreResult<Self> {
        if reject_unknown {
            if let Some(field) = selector.keys().find(|f| !routing.declares(f)) {
                return Err(StoreError::UnknownField(field.clone()));
            }
        }

        let types = routing
            .type_names()
            .map(|type_name| TypePlan::new(type_name, selector, routing))
            .collect();
        Ok(Self { types })
    }

    /// Plans in registration order.
    pub fn types(&self) -> &[TypePlan] {
        &self.types
    }

    /// The plan for `type_name`, or `None` if the type is not registered.
    pub fn for_type(&self, type_name: &str) -> Option<&TypePlan> {
        self.types.iter().find(|t| t.type_name == type_name)
    }

    /// Runs every type's plan and returns the qualifying rows, sorted by
    /// ledger key.
    ///
    /// A base failure is returned. A partition failure is logged and the
    /// partition treated as having matched nothing.
    pub(crate) fn execute(&self, store: &dyn PartitionStore, key_prefix: &str) -> StoreResult<Vec<MergedRow>> {
        let mut rows = BTreeMap::new();
        for plan in &self.types {
            for row in plan.execute(store, key_prefix)? {
                rows.insert(row.ledger_key.clone(), row);
            }
        }
        Ok(rows.into_values().collect())
    }
}

impl TypePlan {
    fn new(type_name: &str, selector: &Selector, routing: &RoutingTable) -> Self {
        let mut plan = Self {
            type_name: type_name.to_string(),
            base: Selector::new(),
            partitions: routing
                .partitions_of(type_name)
                .unwrap_or_default()
                .iter()
                .map(|p| (p.clone(), Selector::new()))
                .collect(),
            required: BTreeSet::new(),
        };

        for (field, predicate) in selector {
            match routing.route_field(type_name, field) {
                Some(FieldRoute::Partitions(targets)) => {
                    for target in targets {
                        if let Some((_, partition_selector)) =
                            plan.partitions.iter_mut().find(|(name, _)| name == target)
                        {
                            partition_selector.insert(field.clone(), predicate.clone());
                        }
                        plan.required.insert(target.clone());
                    }
                }
                Some(FieldRoute::Base) => {
                    plan.base.insert(field.clone(), predicate.clone());
                }
                None => {
                    debug!(record_type = type_name, field = %field, "undeclared selector field sent to base");
                    plan.base.insert(field.clone(), predicate.clone());
                }
            }
        }
        plan
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Predicates sent to the base partition.
    pub fn base_selector(&self) -> &Selector {
        &self.base
    }

    /// Predicates sent to `partition`, or `None` if the type never writes to it.
    pub fn partition_selector(&self, partition: &str) -> Option<&Selector> {
        self.partitions
            .iter()
            .find(|(name, _)| name == partition)
            .map(|(_, selector)| selector)
    }

    /// Partitions every result of this type must have matched in.
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Whether the base query carries predicates of its own.
    pub fn base_required(&self) -> bool {
        !self.base.is_empty()
    }

    fn execute(&self, store: &dyn PartitionStore, key_prefix: &str) -> StoreResult<Vec<MergedRow>> {
        let base_query = PartitionQuery::prefixed(key_prefix).with_selector(self.base.clone());
        let mut rows: BTreeMap<String, MergedRow> = BTreeMap::new();
        for KeyValue { key, value } in store.query(Partition::Base, &base_query)? {
            let base = decode_view(&value)?;
            if base.get(TYPE_FIELD).and_then(Value::as_str) != Some(self.type_name.as_str()) {
                continue;
            }
            rows.insert(
                key.clone(),
                MergedRow {
                    ledger_key: key,
                    base,
                    views: Vec::new(),
                },
            );
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: BTreeSet<String> = rows.keys().cloned().collect();
        let mut matched: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();

        for (partition, selector) in &self.partitions {
            let query = PartitionQuery::prefixed(key_prefix)
                .with_keys(candidates.clone())
                .with_selector(selector.clone());
            let found = match store.query(Partition::Collection(partition), &query) {
                Ok(found) => found,
                Err(e) => {
                    warn!(partition = %partition, prefix = %key_prefix, error = %e, "partition query failed, skipping");
                    continue;
                }
            };

            let mut keys = BTreeSet::new();
            for KeyValue { key, value } in found {
                let Some(row) = rows.get_mut(&key) else { continue };
                match decode_view(&value) {
                    Ok(view) if view.is_empty() => {}
                    Ok(view) => {
                        row.views.push((partition.clone(), view));
                        keys.insert(key);
                    }
                    Err(e) => {
                        warn!(partition = %partition, key = %key, error = %e, "unreadable partition row, skipping");
                    }
                }
            }
            if keys.is_empty() {
                debug!(partition = %partition, record_type = %self.type_name, "partition contributed no rows");
            }
            matched.insert(partition.as_str(), keys);
        }

        rows.retain(|key, _| {
            self.required
                .iter()
                .all(|p| matched.get(p.as_str()).is_some_and(|keys| keys.contains(key)))
        });

        debug!(
            record_type = %self.type_name,
            base_required = self.base_required(),
            required = ?self.required,
            results = rows.len(),
            "query merged"
        );
        Ok(rows.into_values().collect())
    }
}

/// Decodes a stored row, which must be a JSON object.
pub(crate) fn decode_view(bytes: &[u8]) -> StoreResult<FieldMap> {
    match serde_json::from_slice(bytes)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Integrity("stored row is not a JSON object".into())),
    }
}
