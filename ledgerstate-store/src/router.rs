//! Partition routing.
//!
//! Works out, once per registered type, which restricted partitions a type
//! can ever write to and where a selector predicate on each field has to go.

use crate::error::{StoreError, StoreResult};
use ledgerstate_model::{RecordType, Schema, HASH_FIELD, KEY_FIELD, TYPE_FIELD};
use std::collections::BTreeMap;
use tracing::debug;

/// Where the values of a field are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRoute {
    /// Public field or header field.
    Base,
    /// Restricted field, stored in every listed partition.
    Partitions(Vec<String>),
}

/// Every partition named by a rule of `record_type`, nested fields included,
/// deduplicated in first-appearance order.
pub fn partitions_for<R>(record_type: &RecordType<R>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for rule in record_type.schema().rules() {
        for literal in rule.literals() {
            if !out.iter().any(|p| p == literal) {
                out.push(literal.to_string());
            }
        }
    }
    out
}

/// Routing information for every registered type. Immutable once the store
/// is built.
///
/// Routes are kept per type: two types may declare the same field under
/// different rules, and a predicate on it then goes to different partitions
/// for each of them.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    types: Vec<TypeRoutes>,
    partitions: Vec<String>,
}

#[derive(Debug, Clone)]
struct TypeRoutes {
    name: String,
    partitions: Vec<String>,
    fields: BTreeMap<String, FieldRoute>,
}

impl RoutingTable {
    pub(crate) fn register<R>(&mut self, record_type: &RecordType<R>) -> StoreResult<()> {
        let name = record_type.name();
        if self.partitions_of(name).is_some() {
            return Err(StoreError::DuplicateType(name.to_string()));
        }

        let partitions = partitions_for(record_type);
        for partition in &partitions {
            if !self.partitions.contains(partition) {
                self.partitions.push(partition.clone());
            }
        }

        let mut fields = BTreeMap::new();
        for header in [KEY_FIELD, TYPE_FIELD, HASH_FIELD] {
            fields.insert(header.to_string(), FieldRoute::Base);
        }
        route_schema(&mut fields, record_type.schema(), "", &FieldRoute::Base);

        debug!(record_type = name, partitions = ?partitions, "registered record type");
        self.types.push(TypeRoutes {
            name: name.to_string(),
            partitions,
            fields,
        });
        Ok(())
    }

    /// Union of the partitions of every registered type, in registration order.
    pub fn partitions(&self) -> &[String] {
        &self.partitions
    }

    /// Partitions a registered type can write to, or `None` if the type is
    /// not registered.
    pub fn partitions_of(&self, type_name: &str) -> Option<&[String]> {
        self.routes_of(type_name).map(|t| t.partitions.as_slice())
    }

    /// Where predicates on `field` go for records of `type_name`. Nested
    /// fields use dotted paths. `None` if the type is not registered or does
    /// not declare the field.
    pub fn route_field(&self, type_name: &str, field: &str) -> Option<&FieldRoute> {
        self.routes_of(type_name).and_then(|t| t.fields.get(field))
    }

    /// Whether any registered type declares `field`.
    pub fn declares(&self, field: &str) -> bool {
        self.types.iter().any(|t| t.fields.contains_key(field))
    }

    /// Names of the registered types, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name.as_str())
    }

    fn routes_of(&self, type_name: &str) -> Option<&TypeRoutes> {
        self.types.iter().find(|t| t.name == type_name)
    }
}

// Sub-fields without a rule travel with their nested parent.
fn route_schema(
    fields: &mut BTreeMap<String, FieldRoute>,
    schema: &Schema,
    prefix: &str,
    inherited: &FieldRoute,
) {
    for field in schema.fields() {
        let path = format!("{prefix}{}", field.name);
        let route = match &field.rule {
            Some(rule) => FieldRoute::Partitions(
                rule.partitions().into_iter().map(str::to_string).collect(),
            ),
            None => inherited.clone(),
        };
        if let Some(nested) = &field.nested {
            route_schema(fields, nested, &format!("{path}."), &route);
        }
        fields.insert(path, route);
    }
}
