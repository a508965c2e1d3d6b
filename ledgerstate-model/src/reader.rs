//! Typed access to merged field views.

use crate::date;
use crate::error::{ModelError, ModelResult};
use crate::record::FieldMap;
use crate::schema::{FieldDescriptor, FieldType, Schema};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Read access to the merged views of one record, handed to reconstruction
/// paths.
///
/// Values are coerced to their declared type before conversion, so numbers
/// and arrays that reached the store as strings still read back typed.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    schema: &'a Schema,
    fields: &'a FieldMap,
}

impl<'a> FieldReader<'a> {
    pub fn new(schema: &'a Schema, fields: &'a FieldMap) -> Self {
        Self { schema, fields }
    }

    /// The merged field map.
    pub fn fields(&self) -> &'a FieldMap {
        self.fields
    }

    /// Whether the field has a non-null value.
    pub fn contains(&self, name: &str) -> bool {
        self.raw(name).is_some()
    }

    /// The stored value, without coercion. `null` counts as absent.
    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Reads a required field as `T`.
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> ModelResult<T> {
        self.optional(name)?.ok_or_else(|| self.missing(name))
    }

    /// Reads an optional field as `T`.
    pub fn optional<T: DeserializeOwned>(&self, name: &str) -> ModelResult<Option<T>> {
        let Some(raw) = self.raw(name) else {
            return Ok(None);
        };
        let value = match self.schema.field(name) {
            Some(field) => coerce(field, raw).map_err(|reason| invalid(name, reason))?,
            None => raw.clone(),
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| invalid(name, e.to_string()))
    }

    pub fn string(&self, name: &str) -> ModelResult<String> {
        self.value(name)
    }

    pub fn date(&self, name: &str) -> ModelResult<DateTime<Utc>> {
        self.optional_date(name)?.ok_or_else(|| self.missing(name))
    }

    pub fn optional_date(&self, name: &str) -> ModelResult<Option<DateTime<Utc>>> {
        match self.optional::<String>(name)? {
            Some(text) => date::parse_date(&text)
                .map(Some)
                .ok_or_else(|| invalid(name, format!("{text:?} is not a date"))),
            None => Ok(None),
        }
    }

    /// A reader over a required nested record field.
    pub fn nested(&self, name: &str) -> ModelResult<FieldReader<'a>> {
        self.optional_nested(name)?.ok_or_else(|| self.missing(name))
    }

    pub fn optional_nested(&self, name: &str) -> ModelResult<Option<FieldReader<'a>>> {
        let Some(raw) = self.raw(name) else {
            return Ok(None);
        };
        let schema = self
            .schema
            .field(name)
            .and_then(|f| f.nested.as_ref())
            .ok_or_else(|| invalid(name, "not declared as a nested record".into()))?;
        let fields = raw
            .as_object()
            .ok_or_else(|| invalid(name, "expected an object".into()))?;
        Ok(Some(FieldReader::new(schema, fields)))
    }

    pub(crate) fn require(&self, name: &str) -> ModelResult<()> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(self.missing(name))
        }
    }

    fn missing(&self, name: &str) -> ModelError {
        ModelError::MissingField {
            field: name.to_string(),
            field_type: self
                .schema
                .field(name)
                .map_or("undeclared", |f| f.field_type.as_str())
                .to_string(),
        }
    }
}

fn invalid(name: &str, reason: String) -> ModelError {
    ModelError::InvalidField {
        field: name.to_string(),
        reason,
    }
}

/// Converts a stored value to the field's declared type.
///
/// The external store's transport is text-based JSON, so numbers, booleans
/// and arrays may come back as strings.
pub(crate) fn coerce(field: &FieldDescriptor, value: &Value) -> Result<Value, String> {
    match (field.field_type, value) {
        (FieldType::Number, Value::Number(_))
        | (FieldType::Bool, Value::Bool(_))
        | (FieldType::Array, Value::Array(_))
        | (FieldType::Text, Value::String(_))
        | (FieldType::Nested, Value::Object(_)) => Ok(value.clone()),

        (FieldType::Number, Value::String(text)) => {
            let text = text.trim();
            if let Ok(n) = text.parse::<i64>() {
                Ok(Value::from(n))
            } else if let Ok(n) = text.parse::<u64>() {
                Ok(Value::from(n))
            } else {
                text.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("{text:?} is not a number"))
            }
        }
        (FieldType::Bool, Value::String(text)) => match text.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("{text:?} is not a boolean")),
        },
        (FieldType::Array, Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(array @ Value::Array(_)) => Ok(array),
            _ => Err(format!("{text:?} is not an array")),
        },
        (FieldType::Date, Value::String(text)) => date::parse_date(text)
            .map(|d| date::date_value(&d))
            .ok_or_else(|| format!("{text:?} is not a date")),
        (FieldType::Enum, Value::String(text)) => match &field.enum_options {
            Some(options) if !options.iter().any(|o| o == text) => {
                Err(format!("{text:?} is not one of {options:?}"))
            }
            _ => Ok(value.clone()),
        },
        (expected, other) => Err(format!("expected {expected}, found {}", json_kind(other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
