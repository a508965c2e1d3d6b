use ledgerstate_types::RecordKey;
use serde_json::Value;

/// Field values of a record, keyed by field name.
pub type FieldMap = serde_json::Map<String, Value>;

/// Converts a JSON object into a field map. Anything else yields an empty map.
pub fn field_map(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        _ => FieldMap::new(),
    }
}

/// Identity and integrity data every record carries.
///
/// The hash is set exactly once: either computed by
/// [`RecordType::seal`](crate::RecordType::seal) when a record is first built,
/// or taken verbatim from the stored base row when it is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    key: RecordKey,
    type_name: String,
    hash: String,
}

impl RecordHeader {
    /// Header for a freshly built record. The hash is filled in by `seal`.
    pub fn new(type_name: impl Into<String>, key: RecordKey) -> Self {
        Self {
            key,
            type_name: type_name.into(),
            hash: String::new(),
        }
    }

    /// Header for a record rebuilt from storage.
    pub fn restored(type_name: impl Into<String>, key: RecordKey, hash: impl Into<String>) -> Self {
        Self {
            key,
            type_name: type_name.into(),
            hash: hash.into(),
        }
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether a content hash has been assigned.
    pub fn is_sealed(&self) -> bool {
        !self.hash.is_empty()
    }

    pub(crate) fn set_hash(&mut self, hash: String) {
        self.hash = hash;
    }
}

/// A typed record stored across partitions.
///
/// Implementors expose their header and their declared field values as JSON.
/// Absent optional values are either left out of the map or set to `null`;
/// both are treated as "no value".
pub trait Record {
    fn header(&self) -> &RecordHeader;

    fn header_mut(&mut self) -> &mut RecordHeader;

    /// Declared field values, keyed by field name. Header fields are not included.
    fn to_fields(&self) -> FieldMap;

    fn key(&self) -> &RecordKey {
        self.header().key()
    }

    fn hash(&self) -> &str {
        self.header().hash()
    }

    fn type_name(&self) -> &str {
        self.header().type_name()
    }
}
