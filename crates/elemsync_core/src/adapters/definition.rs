//! Adapter definitions: per-type schemas and normalization rules.

use crate::error::{SyncError, SyncResult};
use crate::model::schema::FieldSchema;
use crate::sync::list_policy::ListEdgePolicy;
use crate::sync::naming::NamespacePrefixRule;
use crate::sync::normalize::StructuralRule;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Normalization rules of one type.
#[derive(Debug, Clone)]
pub struct TypeRules {
    pub schema: Arc<FieldSchema>,
    pub structural: Vec<StructuralRule>,
    pub list_policy: Option<Arc<dyn ListEdgePolicy>>,
    pub naming: Option<NamespacePrefixRule>,
}

impl TypeRules {
    pub fn new(schema: FieldSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            structural: Vec::new(),
            list_policy: None,
            naming: None,
        }
    }

    pub fn with_rule(mut self, rule: StructuralRule) -> Self {
        self.structural.push(rule);
        self
    }

    pub fn with_list_policy(mut self, policy: impl ListEdgePolicy + 'static) -> Self {
        self.list_policy = Some(Arc::new(policy));
        self
    }

    pub fn with_naming(mut self, rule: NamespacePrefixRule) -> Self {
        self.naming = Some(rule);
        self
    }
}

/// All type rules of one vendor adapter. Immutable after construction.
#[derive(Debug, Clone)]
pub struct AdapterDefinition {
    name: String,
    types: BTreeMap<String, TypeRules>,
}

impl AdapterDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: BTreeMap::new(),
        }
    }

    /// Adds rules keyed by their schema type name.
    pub fn with_type(mut self, rules: TypeRules) -> Self {
        self.types
            .insert(rules.schema.type_name().to_string(), rules);
        self
    }

    /// Adapter name; also the first segment of every instance path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sorted declared type names.
    pub fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn type_rules(&self, type_name: &str) -> SyncResult<&TypeRules> {
        self.types.get(type_name).ok_or_else(|| {
            SyncError::schema(
                type_name,
                format!("type is not declared by adapter `{}`", self.name),
            )
        })
    }

    /// Edge policy of a type, if any.
    pub fn list_policy(&self, type_name: &str) -> Option<&dyn ListEdgePolicy> {
        self.types
            .get(type_name)
            .and_then(|rules| rules.list_policy.as_deref())
    }
}
