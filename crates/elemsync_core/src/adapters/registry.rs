//! In-process adapter registry.

use crate::adapters::definition::AdapterDefinition;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Adapter registration/lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterRegistryError {
    InvalidAdapterName(String),
    DuplicateAdapterName(String),
    AdapterNotFound(String),
}

impl Display for AdapterRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAdapterName(value) => write!(f, "adapter name is invalid: {value}"),
            Self::DuplicateAdapterName(value) => {
                write!(f, "adapter name already registered: {value}")
            }
            Self::AdapterNotFound(value) => write!(f, "adapter not found: {value}"),
        }
    }
}

impl Error for AdapterRegistryError {}

/// Registered adapter definitions keyed by adapter name.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<AdapterDefinition>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in adapter.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for definition in [
            crate::adapters::jira::definition(),
            crate::adapters::netsuite::definition(),
            crate::adapters::salesforce::definition(),
        ] {
            if let Err(err) = registry.register(definition) {
                log::error!("event=adapter_register module=adapters status=error error={err}");
            }
        }
        registry
    }

    /// Registers one adapter definition.
    pub fn register(&mut self, definition: AdapterDefinition) -> Result<(), AdapterRegistryError> {
        let name = definition.name().trim().to_string();
        if !is_valid_adapter_name(&name) {
            return Err(AdapterRegistryError::InvalidAdapterName(name));
        }
        if self.adapters.contains_key(name.as_str()) {
            return Err(AdapterRegistryError::DuplicateAdapterName(name));
        }

        self.adapters.insert(name, Arc::new(definition));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Returns sorted adapter names.
    pub fn adapter_names(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }

    /// Returns one adapter by name.
    pub fn get(&self, name: &str) -> Result<Arc<AdapterDefinition>, AdapterRegistryError> {
        let normalized = name.trim();
        self.adapters
            .get(normalized)
            .cloned()
            .ok_or_else(|| AdapterRegistryError::AdapterNotFound(normalized.to_string()))
    }
}

fn is_valid_adapter_name(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::{AdapterRegistry, AdapterRegistryError};
    use crate::adapters::definition::AdapterDefinition;

    #[test]
    fn builtin_registers_all_vendor_adapters() {
        let registry = AdapterRegistry::builtin();
        assert_eq!(
            registry.adapter_names(),
            vec!["jira", "netsuite", "salesforce"]
        );
    }

    #[test]
    fn rejects_invalid_or_duplicate_names() {
        let mut registry = AdapterRegistry::new();
        let invalid = registry.register(AdapterDefinition::new("Jira Cloud"));
        assert!(matches!(
            invalid,
            Err(AdapterRegistryError::InvalidAdapterName(_))
        ));
        let blank = registry.register(AdapterDefinition::new("   "));
        assert!(matches!(
            blank,
            Err(AdapterRegistryError::InvalidAdapterName(_))
        ));

        registry
            .register(AdapterDefinition::new("jira"))
            .expect("first adapter should register");
        let duplicate = registry.register(AdapterDefinition::new("jira"));
        assert!(matches!(
            duplicate,
            Err(AdapterRegistryError::DuplicateAdapterName(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_trims_input_and_reports_missing() {
        let registry = AdapterRegistry::builtin();
        assert!(registry.get("  jira  ").is_ok());
        assert_eq!(
            registry.get("zendesk").expect_err("unknown adapter"),
            AdapterRegistryError::AdapterNotFound("zendesk".to_string())
        );
    }
}
