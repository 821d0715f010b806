//! NetSuite adapter: customization records.

use crate::adapters::definition::{AdapterDefinition, TypeRules};
use crate::model::instance::CanonicalInstance;
use crate::model::schema::{FieldDecl, FieldKind, FieldSchema};
use serde_json::{json, Value};

pub const NETSUITE: &str = "netsuite";
pub const ENTITY_CUSTOM_FIELD: &str = "EntityCustomField";
pub const RECORD_REF: &str = "RecordRef";
pub const INTERNAL_ID: &str = "internalId";
pub const SCRIPT_ID: &str = "scriptId";

fn record_ref_schema() -> FieldSchema {
    FieldSchema::new(RECORD_REF)
        .with_attribute_field(INTERNAL_ID, FieldKind::string())
        .with_field(FieldDecl::new("name", FieldKind::string()))
}

pub fn entity_custom_field_schema() -> FieldSchema {
    FieldSchema::new(ENTITY_CUSTOM_FIELD)
        .with_name_field("label")
        .with_field(FieldDecl::new("label", FieldKind::string()).required())
        .with_attribute_field(INTERNAL_ID, FieldKind::string())
        .with_field(FieldDecl::new(SCRIPT_ID, FieldKind::string()))
        .with_field(FieldDecl::new("description", FieldKind::string()))
        .with_field(FieldDecl::new("isMandatory", FieldKind::boolean()))
        .with_field(FieldDecl::new(
            "owner",
            FieldKind::record(record_ref_schema()),
        ))
}

/// NetSuite adapter definition.
pub fn definition() -> AdapterDefinition {
    AdapterDefinition::new(NETSUITE).with_type(TypeRules::new(entity_custom_field_schema()))
}

/// Builds the SOAP-style record: `internalId` plus a body field list.
///
/// Record-valued fields are sent as references by their `internalId`.
pub fn to_netsuite_record(instance: &CanonicalInstance) -> Value {
    let body_fields = instance
        .value
        .iter()
        .filter(|(key, _)| key.as_str() != INTERNAL_ID)
        .map(|(key, value)| match value.get(INTERNAL_ID) {
            Some(id) if value.is_object() => json!({"name": key, INTERNAL_ID: id}),
            _ => json!({"name": key, "value": value}),
        })
        .collect::<Vec<_>>();

    json!({
        INTERNAL_ID: instance.get(INTERNAL_ID).cloned().unwrap_or(Value::Null),
        "bodyFieldList": body_fields,
    })
}
