//! Partition views, view merging and content hashing.
//!
//! A record is written as one *view* per partition: the base view holds the
//! header and every field without a rule, and the view of partition `P` holds
//! the fields whose rule matches `{P}`. Reading merges the base view with the
//! partition views that could be fetched; a key already present is never
//! overwritten, so the base wins over every partition and earlier partitions
//! win over later ones.

use crate::error::{ModelError, ModelResult};
use crate::reader::{coerce, FieldReader};
use crate::record::{FieldMap, Record, RecordHeader};
use crate::record_type::RecordType;
use crate::schema::{Schema, HASH_FIELD, HEADER_FIELDS, KEY_FIELD, TYPE_FIELD};
use ledgerstate_types::RecordKey;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Serializes the part of `record` that belongs to `partition`.
///
/// `partition == None` selects the base view. With `force` every field is
/// included regardless of its rule; that view is what the content hash covers.
pub fn to_partition_view<R: Record>(
    record_type: &RecordType<R>,
    record: &R,
    partition: Option<&str>,
    force: bool,
) -> FieldMap {
    let mut view = FieldMap::new();
    if force || partition.is_none() {
        view.insert(KEY_FIELD.into(), Value::String(record.key().to_string()));
        view.insert(TYPE_FIELD.into(), Value::String(record.type_name().to_string()));
        view.insert(HASH_FIELD.into(), Value::String(record.hash().to_string()));
    }
    project(
        record_type.schema(),
        &record.to_fields(),
        partition,
        force,
        false,
        &mut view,
    );
    view
}

/// Checks every value of `record` against its declared field type.
///
/// A value that fails here would be written as is by
/// [`to_partition_view`] and rejected by [`from_views`] on every later read.
/// Nested fields are reported by dotted path.
pub fn validate<R: Record>(record_type: &RecordType<R>, record: &R) -> ModelResult<()> {
    check_values(record_type.schema(), &record.to_fields(), "")
}

fn check_values(schema: &Schema, values: &FieldMap, prefix: &str) -> ModelResult<()> {
    for field in schema.fields() {
        let Some(value) = values.get(&field.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let path = format!("{prefix}{}", field.name);
        match (&field.nested, value) {
            (Some(nested), Value::Object(inner)) => check_values(nested, inner, &format!("{path}."))?,
            _ => {
                coerce(field, value).map_err(|reason| ModelError::InvalidField { field: path, reason })?;
            }
        }
    }
    Ok(())
}

// `inherited` is set inside a nested record that is itself part of a
// partition view; its rule-less sub-fields travel with it.
fn project(
    schema: &Schema,
    values: &FieldMap,
    partition: Option<&str>,
    force: bool,
    inherited: bool,
    out: &mut FieldMap,
) {
    for field in schema.fields() {
        let Some(value) = values.get(&field.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let visible = force || field.is_visible_in(partition) || (inherited && field.is_public());

        match (&field.nested, value) {
            (Some(nested), Value::Object(inner)) => {
                let mut sub = FieldMap::new();
                if visible {
                    project(nested, inner, partition, force, partition.is_some(), &mut sub);
                    out.insert(field.name.clone(), Value::Object(sub));
                } else if partition.is_some() {
                    // Sub-fields with their own rule can match where the parent does not.
                    project(nested, inner, partition, force, false, &mut sub);
                    if !sub.is_empty() {
                        out.insert(field.name.clone(), Value::Object(sub));
                    }
                }
            }
            _ if visible => {
                let value = coerce(field, value).unwrap_or_else(|_| value.clone());
                out.insert(field.name.clone(), value);
            }
            _ => {}
        }
    }
}

/// Adds every key of `overlay` that `target` lacks. Nested objects present
/// on both sides are merged the same way.
pub fn merge_views(target: &mut FieldMap, overlay: &FieldMap) {
    for (name, value) in overlay {
        match target.get_mut(name) {
            Some(Value::Object(existing)) => {
                if let Value::Object(incoming) = value {
                    merge_views(existing, incoming);
                }
            }
            Some(existing) => {
                if existing.is_null() {
                    *existing = value.clone();
                }
            }
            None => {
                target.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Rebuilds a typed record from its base view and the views of the
/// partitions that contributed, in partition-declaration order.
///
/// The contributing partitions select the reconstruction path; the hash is
/// taken from the base view as stored.
pub fn from_views<R, S>(
    record_type: &RecordType<R>,
    base: FieldMap,
    partitions: &[(S, FieldMap)],
) -> ModelResult<R>
where
    R: Record,
    S: AsRef<str>,
{
    let mut merged = base;
    for (_, view) in partitions {
        merge_views(&mut merged, view);
    }
    let contributing: Vec<&str> = partitions.iter().map(|(name, _)| name.as_ref()).collect();

    let path = record_type.select_path(&contributing)?;
    let header = read_header(record_type, &merged)?;
    let reader = FieldReader::new(record_type.schema(), &merged);
    for field in path.required() {
        reader.require(field)?;
    }

    debug!(
        record_type = record_type.name(),
        key = %header.key(),
        path = path.name(),
        partitions = ?contributing,
        "rebuilding record"
    );
    path.build(header, &reader)
}

fn read_header<R>(record_type: &RecordType<R>, merged: &FieldMap) -> ModelResult<RecordHeader> {
    if let Some(found) = merged.get(TYPE_FIELD).and_then(Value::as_str) {
        if found != record_type.name() {
            return Err(ModelError::TypeMismatch {
                expected: record_type.name().to_string(),
                found: found.to_string(),
            });
        }
    }

    let header_field = |name: &str| {
        merged
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::MissingField {
                field: name.to_string(),
                field_type: "text".to_string(),
            })
    };

    let key = RecordKey::parse(header_field(KEY_FIELD)?)?;
    let hash = header_field(HASH_FIELD)?;
    Ok(RecordHeader::restored(record_type.name(), key, hash))
}

/// Rebuilds the record from its base view only, keeping its hash.
pub fn to_public_form<R: Record>(record_type: &RecordType<R>, record: &R) -> ModelResult<R> {
    let base = to_partition_view(record_type, record, None, false);
    from_views::<R, &str>(record_type, base, &[])
}

/// Lowercase hex SHA-256 over the canonical JSON of every field except `hash`.
pub fn compute_hash<R: Record>(record_type: &RecordType<R>, record: &R) -> String {
    let mut view = to_partition_view(record_type, record, None, true);
    view.remove(HASH_FIELD);
    hash_fields(&view)
}

/// Checks that a disclosed set of field values hashes to the committed hash.
///
/// `disclosed` must hold every field the record had when it was sealed,
/// restricted ones included; header entries in it are ignored.
pub fn verify_disclosure<R>(
    record_type: &RecordType<R>,
    key: &RecordKey,
    disclosed: &FieldMap,
    committed_hash: &str,
) -> ModelResult<()> {
    for name in disclosed.keys() {
        if record_type.field(name).is_none() && !HEADER_FIELDS.contains(&name.as_str()) {
            return Err(ModelError::InvalidField {
                field: name.clone(),
                reason: format!("not declared by `{}`", record_type.name()),
            });
        }
    }

    let mut view = FieldMap::new();
    view.insert(KEY_FIELD.into(), Value::String(key.to_string()));
    view.insert(TYPE_FIELD.into(), Value::String(record_type.name().to_string()));
    project(record_type.schema(), disclosed, None, true, false, &mut view);

    let actual = hash_fields(&view);
    if actual == committed_hash {
        Ok(())
    } else {
        Err(ModelError::HashMismatch {
            expected: committed_hash.to_string(),
            actual,
        })
    }
}

fn hash_fields(view: &FieldMap) -> String {
    let mut text = String::new();
    write_canonical(&mut text, &Value::Object(view.clone()));
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Compact JSON with object keys sorted at every level, independent of the
/// map implementation serde_json was built with.
fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(out, value);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
