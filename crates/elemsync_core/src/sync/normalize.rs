//! Fetch normalizer: raw remote record → canonical instance.
//!
//! # Responsibility
//! - Apply the ordered structural rules of one type to one raw record.
//! - Provide the inverse conversion used to build write payloads.
//!
//! # Invariants
//! - Rule order is fixed: flatten, type rules, prune, list edge, prefix,
//!   required check, kind check, construction.
//! - Unknown remote keys never survive into the canonical value.
//! - A missing required field is surfaced as `MissingField`, never retried.

use crate::adapters::definition::{AdapterDefinition, TypeRules};
use crate::error::{SyncError, SyncResult};
use crate::model::instance::CanonicalInstance;
use crate::model::schema::ATTRIBUTES_KEY;
use crate::sync::list_policy::lookup_mut;
use log::debug;
use serde_json::{Map, Value};

/// Caller-controlled fetch switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Whether prefix-aware types get the namespace prefix inserted.
    pub add_namespace_prefix: bool,
    /// Namespace prefix of the package the record was listed under.
    pub namespace_prefix: Option<String>,
}

impl FetchOptions {
    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = Some(prefix.into());
        self
    }
}

/// Type-specific reshaping applied before pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralRule {
    /// Moves the value at `from` to the top-level key `field`.
    Hoist { from: Vec<String>, field: String },
    /// For every item of the list at `list_path`, replaces `{id_key: x}`
    /// objects inside `item_field` by `x`.
    CollapseIdList {
        list_path: Vec<String>,
        item_field: String,
        id_key: String,
    },
}

impl StructuralRule {
    pub fn hoist(from: &[&str], field: impl Into<String>) -> Self {
        Self::Hoist {
            from: to_path(from),
            field: field.into(),
        }
    }

    pub fn collapse_id_list(
        list_path: &[&str],
        item_field: impl Into<String>,
        id_key: impl Into<String>,
    ) -> Self {
        Self::CollapseIdList {
            list_path: to_path(list_path),
            item_field: item_field.into(),
            id_key: id_key.into(),
        }
    }

    fn apply(&self, record: &mut Map<String, Value>) {
        match self {
            Self::Hoist { from, field } => {
                if let Some(value) = take_at(record, from) {
                    record.insert(field.clone(), value);
                }
            }
            Self::CollapseIdList {
                list_path,
                item_field,
                id_key,
            } => {
                let Some(Value::Array(items)) = lookup_mut(record, list_path) else {
                    return;
                };
                for item in items.iter_mut() {
                    if let Some(Value::Array(entries)) = item.get_mut(item_field.as_str()) {
                        for entry in entries.iter_mut() {
                            if let Some(id) = entry.get(id_key.as_str()).cloned() {
                                *entry = id;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Normalizes raw records of the types one adapter declares.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    definition: &'a AdapterDefinition,
}

impl<'a> Normalizer<'a> {
    pub fn new(definition: &'a AdapterDefinition) -> Self {
        Self { definition }
    }

    /// Turns one raw record into one canonical instance.
    ///
    /// # Errors
    /// - `SchemaViolation` for an undeclared type or an unusable name.
    /// - `InvalidRemoteResponse` when the record is not an object.
    /// - `MissingField` when a required field is absent after pruning.
    /// - `SchemaViolation` when a kept value does not match its declared kind.
    pub fn normalize(
        &self,
        type_name: &str,
        raw: &Value,
        options: &FetchOptions,
    ) -> SyncResult<CanonicalInstance> {
        let rules = self.definition.type_rules(type_name)?;
        let Value::Object(mut record) = flatten_attributes(raw) else {
            return Err(SyncError::invalid_response(
                format!("`{type_name}` record is not an object"),
                raw,
            ));
        };

        for rule in &rules.structural {
            rule.apply(&mut record);
        }

        let mut value = rules.schema.project(&record);
        if let Some(policy) = &rules.list_policy {
            policy.strip_fetched(&mut value);
        }
        apply_namespace_prefix(rules, &mut value, options);
        rules.schema.check_required(&value)?;
        rules.schema.check_kinds(&value)?;

        let instance =
            CanonicalInstance::from_schema(&rules.schema, value, self.definition.name())?;
        debug!(
            "event=normalize module=fetch status=ok type={} instance={} dropped_keys={}",
            type_name,
            instance.full_name(),
            record
                .keys()
                .filter(|key| !rules.schema.declares(key))
                .count()
        );
        Ok(instance)
    }

    /// Re-serializes a canonical instance into the vendor's record shape.
    pub fn to_remote_record(&self, instance: &CanonicalInstance) -> SyncResult<Value> {
        let rules = self.definition.type_rules(&instance.type_name)?;
        Ok(Value::Object(rules.schema.to_remote(&instance.value)))
    }
}

/// Lifts `attributes` markers next to their sibling fields at every depth.
///
/// Sibling values win when a key exists on both levels.
pub fn flatten_attributes(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut flattened = Map::new();
            if let Some(Value::Object(attributes)) = map.get(ATTRIBUTES_KEY) {
                for (key, inner) in attributes {
                    flattened.insert(key.clone(), flatten_attributes(inner));
                }
            }
            for (key, inner) in map {
                if key == ATTRIBUTES_KEY && inner.is_object() {
                    continue;
                }
                flattened.insert(key.clone(), flatten_attributes(inner));
            }
            Value::Object(flattened)
        }
        Value::Array(items) => Value::Array(items.iter().map(flatten_attributes).collect()),
        other => other.clone(),
    }
}

fn apply_namespace_prefix(rules: &TypeRules, value: &mut Map<String, Value>, options: &FetchOptions) {
    if !options.add_namespace_prefix {
        return;
    }
    let (Some(rule), Some(prefix)) = (&rules.naming, options.namespace_prefix.as_deref()) else {
        return;
    };
    if let Some(Value::String(name)) = value.get_mut(&rule.field) {
        *name = rule.apply(name, prefix);
    }
}

fn take_at(record: &mut Map<String, Value>, path: &[String]) -> Option<Value> {
    let (last, parents) = path.split_last()?;
    if parents.is_empty() {
        return record.remove(last);
    }
    match lookup_mut(record, parents)? {
        Value::Object(parent) => parent.remove(last),
        _ => None,
    }
}

fn to_path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|segment| segment.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::{flatten_attributes, StructuralRule};
    use serde_json::{json, Value};

    #[test]
    fn flatten_lifts_attributes_at_any_depth() {
        let raw = json!({
            "attributes": {"internalId": "1", "xsi:type": "t"},
            "owner": {
                "attributes": {"internalId": "2"},
                "inner": [{"attributes": {"internalId": "3"}, "name": "deep"}],
            },
        });
        assert_eq!(
            flatten_attributes(&raw),
            json!({
                "internalId": "1",
                "xsi:type": "t",
                "owner": {
                    "internalId": "2",
                    "inner": [{"internalId": "3", "name": "deep"}],
                },
            })
        );
    }

    #[test]
    fn flatten_prefers_sibling_values() {
        let raw = json!({"attributes": {"id": "attr"}, "id": "sibling"});
        assert_eq!(flatten_attributes(&raw), json!({"id": "sibling"}));
    }

    #[test]
    fn flatten_keeps_non_object_attributes_key() {
        let raw = json!({"attributes": "plain"});
        assert_eq!(flatten_attributes(&raw), raw);
    }

    #[test]
    fn hoist_moves_nested_field_and_is_noop_when_absent() {
        let rule = StructuralRule::hoist(&["config", "columnConfig"], "columnConfig");
        let mut record = json!({"config": {"columnConfig": {"columns": []}, "x": 1}})
            .as_object()
            .cloned()
            .expect("object");
        rule.apply(&mut record);
        assert_eq!(
            Value::Object(record.clone()),
            json!({"config": {"x": 1}, "columnConfig": {"columns": []}})
        );

        let before = record.clone();
        StructuralRule::hoist(&["missing", "path"], "other").apply(&mut record);
        assert_eq!(record, before);
    }

    #[test]
    fn collapse_id_list_keeps_primitive_entries() {
        let rule = StructuralRule::collapse_id_list(&["columnConfig", "columns"], "statuses", "id");
        let mut record = json!({
            "columnConfig": {"columns": [
                {"name": "a", "statuses": [{"id": "1", "self": "url"}, "2"]},
                {"name": "b"},
            ]}
        })
        .as_object()
        .cloned()
        .expect("object");
        rule.apply(&mut record);
        assert_eq!(
            record["columnConfig"]["columns"][0]["statuses"],
            json!(["1", "2"])
        );
    }
}
