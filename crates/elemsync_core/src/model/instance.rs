//! Canonical instance of one remote object.
//!
//! # Responsibility
//! - Hold the normalized value mapping of a remote object with its identity.
//! - Derive name and hierarchical path deterministically from data.
//!
//! # Invariants
//! - Every top-level value key is declared by the type schema.
//! - `path` is `[<namespace>, "Records", <type>, <name>]`.

use crate::error::{SyncError, SyncResult};
use crate::model::elem_id::{naclify, ElemId};
use crate::model::schema::FieldSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Second path segment under which all fetched records live.
pub const RECORDS_PATH: &str = "Records";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalInstance {
    #[serde(rename = "type")]
    pub type_name: String,
    pub elem_id: ElemId,
    pub path: Vec<String>,
    pub value: Map<String, Value>,
}

impl CanonicalInstance {
    /// Builds an instance whose name is derived from the schema's name field.
    ///
    /// # Errors
    /// - `SchemaViolation` when the schema has no name field, the name value is
    ///   absent, non-string or empty, or `values` holds an undeclared key.
    pub fn from_schema(
        schema: &FieldSchema,
        values: Map<String, Value>,
        namespace: &str,
    ) -> SyncResult<Self> {
        let type_name = schema.type_name();
        if let Some(key) = schema.first_undeclared(&values) {
            return Err(SyncError::schema(
                type_name,
                format!("field `{key}` is not declared"),
            ));
        }

        let name_field = schema
            .name_field()
            .ok_or_else(|| SyncError::schema(type_name, "type has no designated name field"))?;
        let raw_name = match values.get(name_field) {
            Some(Value::String(raw)) => raw.as_str(),
            Some(_) => {
                return Err(SyncError::schema(
                    type_name,
                    format!("name field `{name_field}` is not a string"),
                ))
            }
            None => {
                return Err(SyncError::schema(
                    type_name,
                    format!("name field `{name_field}` is absent"),
                ))
            }
        };
        let name = naclify(raw_name);
        if name.is_empty() {
            return Err(SyncError::schema(
                type_name,
                format!("name field `{name_field}` is empty"),
            ));
        }

        Ok(Self {
            type_name: type_name.to_string(),
            path: vec![
                namespace.to_string(),
                RECORDS_PATH.to_string(),
                type_name.to_string(),
                name.clone(),
            ],
            elem_id: ElemId::new(namespace, type_name, name),
            value: values,
        })
    }

    pub fn full_name(&self) -> String {
        self.elem_id.full_name()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.value.get(field).and_then(Value::as_str)
    }
}
