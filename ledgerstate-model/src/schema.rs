use ledgerstate_rules::{RuleSyntaxError, VisibilityRule};
use serde::{Deserialize, Serialize};

/// Header field holding the joined record key.
pub const KEY_FIELD: &str = "key";
/// Header field holding the record type name.
pub const TYPE_FIELD: &str = "stateClass";
/// Header field holding the content hash.
pub const HASH_FIELD: &str = "hash";

pub(crate) const HEADER_FIELDS: [&str; 3] = [KEY_FIELD, TYPE_FIELD, HASH_FIELD];

/// Declared fields of a record type, or of a nested record, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn push(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    /// Every visibility rule declared in this schema, nested schemas included,
    /// in declaration order.
    pub fn rules(&self) -> Vec<&VisibilityRule> {
        let mut out = Vec::new();
        for field in &self.fields {
            if let Some(rule) = &field.rule {
                out.push(rule);
            }
            if let Some(nested) = &field.nested {
                out.extend(nested.rules());
            }
        }
        out
    }
}

/// A declared field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    /// Partitions the field is stored in. `None` means the base partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<VisibilityRule>,
    /// Allowed enum values. Only meaningful when FieldType is Enum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<Vec<String>>,
    /// Field layout of a nested record. Only meaningful when FieldType is Nested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Schema>,
}

impl FieldDescriptor {
    fn simple(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            rule: None,
            enum_options: None,
            nested: None,
        }
    }

    /// Shorthand for a text field.
    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text)
    }

    /// Shorthand for a boolean field.
    pub fn bool(name: &str) -> Self {
        Self::simple(name, FieldType::Bool)
    }

    /// Shorthand for a numeric field.
    pub fn number(name: &str) -> Self {
        Self::simple(name, FieldType::Number)
    }

    /// Shorthand for a date field.
    pub fn date(name: &str) -> Self {
        Self::simple(name, FieldType::Date)
    }

    /// Shorthand for an array field.
    pub fn array(name: &str) -> Self {
        Self::simple(name, FieldType::Array)
    }

    /// Shorthand for an enum field with fixed options.
    pub fn enumeration(name: &str, options: &[&str]) -> Self {
        Self {
            enum_options: Some(options.iter().map(|o| o.to_string()).collect()),
            ..Self::simple(name, FieldType::Enum)
        }
    }

    /// Shorthand for a nested record field.
    pub fn nested(name: &str, schema: Schema) -> Self {
        Self {
            nested: Some(schema),
            ..Self::simple(name, FieldType::Nested)
        }
    }

    /// Restricts the field to the partitions matched by `rule`.
    pub fn visible_in(self, rule: &str) -> Result<Self, RuleSyntaxError> {
        Ok(self.with_rule(VisibilityRule::parse(rule)?))
    }

    /// Restricts the field to the partitions matched by an already parsed rule.
    pub fn with_rule(mut self, rule: VisibilityRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Returns true if the field has no rule and therefore lives in the base partition.
    pub fn is_public(&self) -> bool {
        self.rule.is_none()
    }

    /// Whether the field belongs in the view of `partition` (`None` = base).
    pub fn is_visible_in(&self, partition: Option<&str>) -> bool {
        match (partition, &self.rule) {
            (None, rule) => rule.is_none(),
            (Some(_), None) => false,
            (Some(partition), Some(rule)) => rule.matches(partition),
        }
    }
}

/// The value type of a declared field.
///
/// Enum options and nested layouts live on `FieldDescriptor` rather than
/// inside this enum, so the type stays `Copy` and serializes as a plain name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Bool,
    Enum,
    Date,
    Number,
    Array,
    Nested,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Bool => "bool",
            FieldType::Enum => "enum",
            FieldType::Date => "date",
            FieldType::Number => "number",
            FieldType::Array => "array",
            FieldType::Nested => "nested",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
