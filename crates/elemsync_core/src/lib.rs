//! Synchronization core for remote admin-console objects.
//! Fetch turns untrusted vendor payloads into canonical instances; deploy
//! pushes a change and re-reads the remote until it converges.

pub mod adapters;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;
pub mod sync;

pub use adapters::definition::{AdapterDefinition, TypeRules};
pub use adapters::jira::BoardColumnsDeployer;
pub use adapters::registry::{AdapterRegistry, AdapterRegistryError};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::change::Change;
pub use model::elem_id::ElemId;
pub use model::instance::CanonicalInstance;
pub use model::schema::{FieldDecl, FieldKind, FieldSchema};
pub use service::sync_service::SyncService;
pub use sync::client::{RawResponse, RemoteClient, TransportError};
pub use sync::deploy::{
    BackoffPolicy, CancellationToken, DeployEngine, DeployOutcome, FieldGroupDeployer,
    RetryBudget,
};
pub use sync::guard::{KeyRule, ResponseShape, ShapeKind, ValidatedShape};
pub use sync::list_policy::{ImplicitLeadingEntry, ListEdgePolicy};
pub use sync::naming::{NamespacePrefixRule, SegmentSplit};
pub use sync::normalize::{FetchOptions, Normalizer, StructuralRule};
pub use sync::reference::{ElementIndex, ReferenceResolver};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
