//! Record model for ledgerstate.
//!
//! Defines the static metadata and the (de)serialization of partitioned records:
//! - [`FieldDescriptor`] / [`Schema`]: declared fields, their value types and
//!   optional visibility rules
//! - [`Record`] / [`RecordHeader`]: the trait user record types implement and
//!   the identity/hash header every record carries
//! - [`RecordType`]: a registered record type: its fields plus an ordered list
//!   of [`ReconstructionPath`]s, one default and any number conditional
//! - [`serializer`]: partition views, view merging, path selection, content
//!   hashing and disclosure verification
//!
//! A field with no rule lives in the base partition. A field with a rule lives
//! in every partition the rule matches on its own. Reading merges the base view
//! with whichever partition views the caller could fetch and picks the
//! reconstruction path that fits the partitions that contributed.

pub mod date;
mod error;
mod reader;
mod record;
mod record_type;
mod schema;
pub mod serializer;

pub use error::{ModelError, ModelResult};
pub use reader::FieldReader;
pub use record::{field_map, FieldMap, Record, RecordHeader};
pub use record_type::{BuildFn, ReconstructionPath, RecordType, RecordTypeBuilder};
pub use schema::{FieldDescriptor, FieldType, Schema, HASH_FIELD, KEY_FIELD, TYPE_FIELD};

pub use ledgerstate_rules::{RuleSyntaxError, VisibilityRule};
pub use ledgerstate_types::RecordKey;
