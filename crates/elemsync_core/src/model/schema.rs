//! Per-type field schema declarations.
//!
//! # Responsibility
//! - Declare which raw attributes a type keeps, their nesting and renames.
//! - Provide the pure projection used for field pruning and its inverse.
//!
//! # Invariants
//! - Schemas are immutable once built and shared through `Arc`.
//! - Projection output keys follow declaration order, not raw payload order.

use crate::error::{SyncError, SyncResult};
use crate::sync::guard::value_label;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Raw key holding vendor identity markers (`id`, type tags, ...).
pub const ATTRIBUTES_KEY: &str = "attributes";

/// Primitive value kinds a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

/// Declared shape of one field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive(PrimitiveKind),
    /// Nested record with its own schema; pruning recurses into it.
    Record(Arc<FieldSchema>),
    List(Box<FieldKind>),
    /// Opaque value kept as-is.
    Any,
}

impl FieldKind {
    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    pub fn number() -> Self {
        Self::Primitive(PrimitiveKind::Number)
    }

    pub fn boolean() -> Self {
        Self::Primitive(PrimitiveKind::Boolean)
    }

    pub fn record(schema: FieldSchema) -> Self {
        Self::Record(Arc::new(schema))
    }

    pub fn list_of(kind: FieldKind) -> Self {
        Self::List(Box::new(kind))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Primitive(PrimitiveKind::String) => "string",
            Self::Primitive(PrimitiveKind::Number) => "number",
            Self::Primitive(PrimitiveKind::Boolean) => "boolean",
            Self::Record(_) => "object",
            Self::List(_) => "array",
            Self::Any => "any",
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Raw key the field is read from / written to when it differs from `name`.
    pub remote_name: Option<String>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            remote_name: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn renamed_from(mut self, remote_name: impl Into<String>) -> Self {
        self.remote_name = Some(remote_name.into());
        self
    }

    fn remote_key(&self) -> &str {
        self.remote_name.as_deref().unwrap_or(self.name.as_str())
    }
}

/// Field schema of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    type_name: String,
    name_field: Option<String>,
    fields: Vec<FieldDecl>,
    attribute_fields: Vec<String>,
}

impl FieldSchema {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name_field: None,
            fields: Vec::new(),
            attribute_fields: Vec::new(),
        }
    }

    /// Designates the field instance names are derived from.
    pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = Some(field.into());
        self
    }

    /// Declares a field; a later declaration with the same name replaces it.
    pub fn with_field(mut self, decl: FieldDecl) -> Self {
        self.fields.retain(|existing| existing.name != decl.name);
        self.fields.push(decl);
        self
    }

    /// Declares a field that lives under `attributes` on the wire.
    pub fn with_attribute_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        if !self.attribute_fields.contains(&name) {
            self.attribute_fields.push(name.clone());
        }
        self.with_field(FieldDecl::new(name, kind))
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name_field(&self) -> Option<&str> {
        self.name_field.as_deref()
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn attribute_fields(&self) -> &[String] {
        &self.attribute_fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|decl| decl.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the first top-level key of `values` this schema does not declare.
    pub fn first_undeclared<'a>(&self, values: &'a Map<String, Value>) -> Option<&'a str> {
        values
            .keys()
            .map(String::as_str)
            .find(|key| !self.declares(key))
    }

    /// Schema-driven projection of a raw mapping.
    ///
    /// Undeclared keys are dropped at this level and inside every declared
    /// nested record. Renamed fields are read from their remote key.
    pub fn project(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let mut projected = Map::new();
        for decl in &self.fields {
            let value = raw.get(decl.remote_key()).or_else(|| raw.get(&decl.name));
            if let Some(value) = value {
                projected.insert(decl.name.clone(), project_value(&decl.kind, value));
            }
        }
        projected
    }

    /// Fails with `MissingField` when a required field is absent, recursing into
    /// nested records that are present.
    pub fn check_required(&self, values: &Map<String, Value>) -> SyncResult<()> {
        for decl in &self.fields {
            match values.get(&decl.name) {
                None | Some(Value::Null) if decl.required => {
                    return Err(SyncError::MissingField {
                        type_name: self.type_name.clone(),
                        field: decl.name.clone(),
                    });
                }
                Some(value) => check_required_value(&decl.kind, value)?,
                None => {}
            }
        }
        Ok(())
    }

    /// Fails with `SchemaViolation` when a present value does not match its
    /// declared kind, recursing into nested records and lists. Nulls pass.
    pub fn check_kinds(&self, values: &Map<String, Value>) -> SyncResult<()> {
        for decl in &self.fields {
            if let Some(value) = values.get(&decl.name) {
                check_kind_value(&self.type_name, &decl.name, &decl.kind, value)?;
            }
        }
        Ok(())
    }

    /// Inverse of attribute flattening plus renames: canonical → wire shape.
    pub fn to_remote(&self, values: &Map<String, Value>) -> Map<String, Value> {
        let mut attributes = Map::new();
        let mut body = Map::new();
        for (key, value) in values {
            let decl = self.field(key);
            let converted = match decl {
                Some(decl) => remote_value(&decl.kind, value),
                None => value.clone(),
            };
            if self.attribute_fields.iter().any(|field| field == key) {
                attributes.insert(key.clone(), converted);
                continue;
            }
            let remote_key = decl.map(FieldDecl::remote_key).unwrap_or(key.as_str());
            body.insert(remote_key.to_string(), converted);
        }

        if attributes.is_empty() {
            return body;
        }
        let mut record = Map::new();
        record.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
        record.extend(body);
        record
    }
}

fn project_value(kind: &FieldKind, value: &Value) -> Value {
    match (kind, value) {
        (FieldKind::Record(schema), Value::Object(map)) => Value::Object(schema.project(map)),
        (FieldKind::List(inner), Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| project_value(inner, item))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn check_required_value(kind: &FieldKind, value: &Value) -> SyncResult<()> {
    match (kind, value) {
        (FieldKind::Record(schema), Value::Object(map)) => schema.check_required(map),
        (FieldKind::List(inner), Value::Array(items)) => items
            .iter()
            .try_for_each(|item| check_required_value(inner, item)),
        _ => Ok(()),
    }
}

fn check_kind_value(
    type_name: &str,
    field: &str,
    kind: &FieldKind,
    value: &Value,
) -> SyncResult<()> {
    let matches = match (kind, value) {
        (_, Value::Null) | (FieldKind::Any, _) => true,
        (FieldKind::Primitive(PrimitiveKind::String), Value::String(_)) => true,
        (FieldKind::Primitive(PrimitiveKind::Number), Value::Number(_)) => true,
        (FieldKind::Primitive(PrimitiveKind::Boolean), Value::Bool(_)) => true,
        (FieldKind::Record(schema), Value::Object(map)) => return schema.check_kinds(map),
        (FieldKind::List(inner), Value::Array(items)) => {
            return items
                .iter()
                .try_for_each(|item| check_kind_value(type_name, field, inner, item))
        }
        _ => false,
    };
    if matches {
        return Ok(());
    }
    Err(SyncError::schema(
        type_name,
        format!(
            "field `{field}` should be {}, got {}",
            kind.label(),
            value_label(value)
        ),
    ))
}

fn remote_value(kind: &FieldKind, value: &Value) -> Value {
    match (kind, value) {
        (FieldKind::Record(schema), Value::Object(map)) => Value::Object(schema.to_remote(map)),
        (FieldKind::List(inner), Value::Array(items)) => {
            Value::Array(items.iter().map(|item| remote_value(inner, item)).collect())
        }
        _ => value.clone(),
    }
}
