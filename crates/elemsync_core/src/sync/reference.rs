//! Reference resolution against the current element universe.
//!
//! A symbolic reference is an object `{"$ref": "<full name>"}` anywhere in an
//! instance value. Resolution swaps it for the target's lookup value (its
//! `id` field), which is what vendor write APIs expect.

use crate::error::{SyncError, SyncResult};
use crate::model::instance::CanonicalInstance;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key marking a symbolic reference object.
pub const REFERENCE_KEY: &str = "$ref";
/// Field of the target instance substituted for a reference.
pub const LOOKUP_FIELD: &str = "id";

/// Substitutes concrete identifiers for symbolic references.
pub trait ReferenceResolver: Send + Sync {
    /// # Errors
    /// - `UnresolvedReference` when any reference cannot be resolved.
    fn resolve(&self, instance: &CanonicalInstance) -> SyncResult<CanonicalInstance>;
}

/// Builds a reference value pointing at `target`.
pub fn reference_to(target: &CanonicalInstance) -> Value {
    let mut map = Map::new();
    map.insert(REFERENCE_KEY.to_string(), Value::String(target.full_name()));
    Value::Object(map)
}

/// In-memory element universe keyed by full name.
#[derive(Debug, Clone, Default)]
pub struct ElementIndex {
    elements: BTreeMap<String, CanonicalInstance>,
}

impl ElementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instances(instances: impl IntoIterator<Item = CanonicalInstance>) -> Self {
        let mut index = Self::new();
        for instance in instances {
            index.insert(instance);
        }
        index
    }

    /// Inserts or replaces an element by full name.
    pub fn insert(&mut self, instance: CanonicalInstance) {
        self.elements.insert(instance.full_name(), instance);
    }

    pub fn get(&self, full_name: &str) -> Option<&CanonicalInstance> {
        self.elements.get(full_name)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn resolve_value(&self, owner: &str, value: &Value) -> SyncResult<Value> {
        match value {
            Value::Object(map) => {
                if let Some(target) = reference_target(map) {
                    return self.lookup(owner, target);
                }
                let mut resolved = Map::new();
                for (key, inner) in map {
                    resolved.insert(key.clone(), self.resolve_value(owner, inner)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(owner, item))
                .collect::<SyncResult<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn lookup(&self, owner: &str, target: &str) -> SyncResult<Value> {
        self.elements
            .get(target)
            .and_then(|element| element.get(LOOKUP_FIELD))
            .cloned()
            .ok_or_else(|| SyncError::UnresolvedReference {
                instance: owner.to_string(),
                reference: target.to_string(),
            })
    }
}

impl ReferenceResolver for ElementIndex {
    fn resolve(&self, instance: &CanonicalInstance) -> SyncResult<CanonicalInstance> {
        let owner = instance.full_name();
        let mut value = Map::new();
        for (key, inner) in &instance.value {
            value.insert(key.clone(), self.resolve_value(&owner, inner)?);
        }
        Ok(CanonicalInstance {
            value,
            ..instance.clone()
        })
    }
}

fn reference_target(map: &Map<String, Value>) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    map.get(REFERENCE_KEY).and_then(Value::as_str)
}
