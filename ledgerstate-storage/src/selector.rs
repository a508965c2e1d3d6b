//! Selector evaluation for JSON documents.
//!
//! Supported subset of the JSON-store selector language:
//!
//! - `{"field": value}`: equality
//! - `{"field": {"$op": arg, ...}}` with `$eq`, `$ne`, `$gt`, `$gte`, `$lt`,
//!   `$lte`, `$in`, `$nin` and `$exists`; every operator must hold
//! - `"a.b"` addresses field `b` of the nested object `a`
//!
//! Numbers compare by value (`1` equals `1.0`), strings lexicographically.
//! Ordering between other kinds never holds. Unknown operators never match.

use crate::query::Selector;
use serde_json::Value;
use std::cmp::Ordering;

/// Returns true if `document` satisfies every predicate of `selector`.
pub fn matches(selector: &Selector, document: &Value) -> bool {
    selector
        .iter()
        .all(|(field, condition)| condition_holds(condition, lookup(document, field)))
}

/// Resolves a dotted field path.
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |current, part| current.get(part))
}

fn condition_holds(condition: &Value, value: Option<&Value>) -> bool {
    match condition {
        Value::Object(ops) if is_operator_object(ops) => ops
            .iter()
            .all(|(op, arg)| operator_holds(op, arg, value)),
        _ => value.is_some_and(|v| values_equal(v, condition)),
    }
}

fn is_operator_object(ops: &Selector) -> bool {
    !ops.is_empty() && ops.keys().all(|k| k.starts_with('$'))
}

fn operator_holds(op: &str, arg: &Value, value: Option<&Value>) -> bool {
    match op {
        "$eq" => value.is_some_and(|v| values_equal(v, arg)),
        "$ne" => !value.is_some_and(|v| values_equal(v, arg)),
        "$gt" => compare(value, arg) == Some(Ordering::Greater),
        "$gte" => matches!(compare(value, arg), Some(Ordering::Greater | Ordering::Equal)),
        "$lt" => compare(value, arg) == Some(Ordering::Less),
        "$lte" => matches!(compare(value, arg), Some(Ordering::Less | Ordering::Equal)),
        "$in" => arg
            .as_array()
            .is_some_and(|items| value.is_some_and(|v| items.iter().any(|i| values_equal(v, i)))),
        "$nin" => arg
            .as_array()
            .is_some_and(|items| !value.is_some_and(|v| items.iter().any(|i| values_equal(v, i)))),
        "$exists" => arg.as_bool() == Some(value.is_some()),
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(value: Option<&Value>, arg: &Value) -> Option<Ordering> {
    match (value?, arg) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
