//! Record types and their reconstruction paths.

use crate::error::{ModelError, ModelResult};
use crate::reader::FieldReader;
use crate::record::{Record, RecordHeader};
use crate::schema::{FieldDescriptor, FieldType, Schema, HEADER_FIELDS};
use crate::serializer;
use ledgerstate_rules::{RuleSyntaxError, VisibilityRule};
use std::collections::HashSet;
use std::fmt;

/// Builds a typed record from a header and the merged field views.
pub type BuildFn<R> = fn(RecordHeader, &FieldReader<'_>) -> ModelResult<R>;

/// A named way of rebuilding a record from merged views.
///
/// The default path is used when only the base partition contributed.
/// Conditional paths carry a rule that is evaluated against the set of
/// partitions that contributed; among the matching ones the path with the
/// most required fields wins.
pub struct ReconstructionPath<R> {
    name: String,
    rule: Option<VisibilityRule>,
    required: Vec<String>,
    build: BuildFn<R>,
}

impl<R> ReconstructionPath<R> {
    /// The path used when no restricted partition contributed.
    pub fn default_path(name: &str, required: &[&str], build: BuildFn<R>) -> Self {
        Self {
            name: name.into(),
            rule: None,
            required: required.iter().map(|f| f.to_string()).collect(),
            build,
        }
    }

    /// A path selected when `rule` holds for the contributing partitions.
    pub fn conditional(
        name: &str,
        rule: &str,
        required: &[&str],
        build: BuildFn<R>,
    ) -> Result<Self, RuleSyntaxError> {
        Ok(Self {
            name: name.into(),
            rule: Some(VisibilityRule::parse(rule)?),
            required: required.iter().map(|f| f.to_string()).collect(),
            build,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> Option<&VisibilityRule> {
        self.rule.as_ref()
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn is_default(&self) -> bool {
        self.rule.is_none()
    }

    pub(crate) fn build(&self, header: RecordHeader, reader: &FieldReader<'_>) -> ModelResult<R> {
        (self.build)(header, reader)
    }
}

impl<R> Clone for ReconstructionPath<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            rule: self.rule.clone(),
            required: self.required.clone(),
            build: self.build,
        }
    }
}

impl<R> fmt::Debug for ReconstructionPath<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconstructionPath")
            .field("name", &self.name)
            .field("rule", &self.rule.as_ref().map(VisibilityRule::source))
            .field("required", &self.required)
            .finish()
    }
}

/// Static metadata of a record type: its fields and how to rebuild it.
///
/// Built once, typically in a `LazyLock`, and shared read-only afterwards.
pub struct RecordType<R> {
    name: String,
    schema: Schema,
    paths: Vec<ReconstructionPath<R>>,
    default_index: usize,
}

impl<R> RecordType<R> {
    pub fn builder(name: &str) -> RecordTypeBuilder<R> {
        RecordTypeBuilder {
            name: name.into(),
            schema: Schema::default(),
            paths: Vec::new(),
        }
    }

    /// The type tag stored in every base row of this type.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.schema.field(name)
    }

    pub fn paths(&self) -> &[ReconstructionPath<R>] {
        &self.paths
    }

    pub fn default_path(&self) -> &ReconstructionPath<R> {
        &self.paths[self.default_index]
    }

    /// Picks the reconstruction path for a set of contributing partitions.
    pub fn select_path<S: AsRef<str>>(&self, contributing: &[S]) -> ModelResult<&ReconstructionPath<R>> {
        if contributing.is_empty() {
            return Ok(self.default_path());
        }

        let mut best: Option<&ReconstructionPath<R>> = None;
        for path in &self.paths {
            let Some(rule) = &path.rule else { continue };
            if !rule.evaluate(contributing) {
                continue;
            }
            // Strictly greater keeps the earliest declared path on ties.
            if best.is_none_or(|b| path.required.len() > b.required.len()) {
                best = Some(path);
            }
        }

        best.ok_or_else(|| ModelError::NoReconstructionPath {
            type_name: self.name.clone(),
            partitions: contributing.iter().map(|p| p.as_ref().to_string()).collect(),
        })
    }
}

impl<R: Record> RecordType<R> {
    /// Computes and stores the content hash of a freshly built record.
    ///
    /// Call exactly once, when the record is constructed. Rebuilt records keep
    /// the hash they were stored with.
    pub fn seal(&self, mut record: R) -> R {
        let hash = serializer::compute_hash(self, &record);
        record.header_mut().set_hash(hash);
        record
    }
}

impl<R> fmt::Debug for RecordType<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("paths", &self.paths)
            .finish()
    }
}

/// Builder for [`RecordType`]; `build` validates the definition.
pub struct RecordTypeBuilder<R> {
    name: String,
    schema: Schema,
    paths: Vec<ReconstructionPath<R>>,
}

impl<R> RecordTypeBuilder<R> {
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.schema.push(field);
        self
    }

    /// Adds every field of a shared schema, e.g. fields common to several types.
    pub fn fields(mut self, schema: &Schema) -> Self {
        for field in schema.fields() {
            self.schema.push(field.clone());
        }
        self
    }

    pub fn path(mut self, path: ReconstructionPath<R>) -> Self {
        self.paths.push(path);
        self
    }

    pub fn build(self) -> ModelResult<RecordType<R>> {
        if self.name.is_empty() {
            return Err(ModelError::InvalidDefinition("record type name is empty".into()));
        }

        validate_schema(&self.name, &self.schema, true)?;

        let defaults: Vec<usize> = self
            .paths
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_default())
            .map(|(i, _)| i)
            .collect();
        let default_index = match defaults.as_slice() {
            [index] => *index,
            [] => {
                return Err(ModelError::InvalidDefinition(format!(
                    "record type `{}` has no default reconstruction path",
                    self.name
                )));
            }
            _ => {
                return Err(ModelError::InvalidDefinition(format!(
                    "record type `{}` has {} default reconstruction paths",
                    self.name,
                    defaults.len()
                )));
            }
        };

        let mut path_names = HashSet::new();
        for path in &self.paths {
            if !path_names.insert(path.name.as_str()) {
                return Err(ModelError::InvalidDefinition(format!(
                    "record type `{}` declares path `{}` twice",
                    self.name, path.name
                )));
            }
            for required in &path.required {
                if self.schema.field(required).is_none() {
                    return Err(ModelError::InvalidDefinition(format!(
                        "path `{}` of `{}` requires undeclared field `{required}`",
                        path.name, self.name
                    )));
                }
            }
        }

        Ok(RecordType {
            name: self.name,
            schema: self.schema,
            paths: self.paths,
            default_index,
        })
    }
}

fn validate_schema(type_name: &str, schema: &Schema, top_level: bool) -> ModelResult<()> {
    let mut names = HashSet::new();
    for field in schema.fields() {
        if field.name.is_empty() {
            return Err(ModelError::InvalidDefinition(format!(
                "record type `{type_name}` declares a field with an empty name"
            )));
        }
        if top_level && HEADER_FIELDS.contains(&field.name.as_str()) {
            return Err(ModelError::InvalidDefinition(format!(
                "field `{}` of `{type_name}` shadows a header field",
                field.name
            )));
        }
        if !names.insert(field.name.as_str()) {
            return Err(ModelError::InvalidDefinition(format!(
                "record type `{type_name}` declares field `{}` twice",
                field.name
            )));
        }
        match (field.field_type, &field.nested) {
            (FieldType::Nested, Some(nested)) => validate_schema(type_name, nested, false)?,
            (FieldType::Nested, None) => {
                return Err(ModelError::InvalidDefinition(format!(
                    "nested field `{}` of `{type_name}` has no schema",
                    field.name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
