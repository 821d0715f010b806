//! Sync use-case service.
//!
//! # Responsibility
//! - Fetch one record or one paged collection and normalize it.
//! - Deploy one change with the configured retry budget and backoff.
//!
//! # Invariants
//! - Every fetched body passes a response guard before normalization.
//! - One service call handles one logical remote object (or one collection
//!   page of them); nothing is cached between calls.

use crate::adapters::definition::AdapterDefinition;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::model::change::Change;
use crate::model::instance::CanonicalInstance;
use crate::sync::client::{ensure_success, RemoteClient};
use crate::sync::deploy::{CancellationToken, DeployEngine, DeployOutcome, FieldGroupDeployer};
use crate::sync::guard::{KeyRule, ResponseShape, ShapeKind};
use crate::sync::normalize::Normalizer;
use crate::sync::reference::ReferenceResolver;
use log::info;
use serde_json::Value;
use std::sync::Arc;

/// Key of the item list in paged collection responses.
pub const COLLECTION_VALUES_KEY: &str = "values";

/// Fetch/deploy service bound to one vendor adapter and client.
pub struct SyncService<C: RemoteClient> {
    client: C,
    definition: Arc<AdapterDefinition>,
    config: SyncConfig,
}

impl<C: RemoteClient> SyncService<C> {
    pub fn new(client: C, definition: Arc<AdapterDefinition>, config: SyncConfig) -> Self {
        Self {
            client,
            definition,
            config,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn definition(&self) -> &AdapterDefinition {
        &self.definition
    }

    /// Fetches and normalizes one record.
    ///
    /// `namespace_prefix` is the package namespace the record was listed
    /// under; it is only used when prefix insertion is enabled in config.
    pub fn fetch_instance(
        &self,
        type_name: &str,
        path: &str,
        namespace_prefix: Option<&str>,
    ) -> SyncResult<CanonicalInstance> {
        let body = self.get_body(path)?;
        ResponseShape::object(format!("{type_name} record"), Vec::new()).validate(&body)?;
        let options = self.config.fetch_options(namespace_prefix);
        Normalizer::new(&self.definition).normalize(type_name, &body, &options)
    }

    /// Fetches one `{"values": [...]}` page and normalizes every item.
    pub fn fetch_collection(
        &self,
        type_name: &str,
        path: &str,
        namespace_prefix: Option<&str>,
    ) -> SyncResult<Vec<CanonicalInstance>> {
        let body = self.get_body(path)?;
        let shape = ResponseShape::object(
            format!("{type_name} collection"),
            vec![KeyRule::new(
                COLLECTION_VALUES_KEY,
                ShapeKind::array_of(ShapeKind::object(Vec::new())),
            )],
        );
        let validated = shape.validate(&body)?;

        let options = self.config.fetch_options(namespace_prefix);
        let normalizer = Normalizer::new(&self.definition);
        let instances = validated
            .array(COLLECTION_VALUES_KEY)?
            .iter()
            .map(|record| normalizer.normalize(type_name, record, &options))
            .collect::<SyncResult<Vec<_>>>()?;
        info!(
            "event=fetch_collection module=service status=ok type={} path={} count={}",
            type_name,
            path,
            instances.len()
        );
        Ok(instances)
    }

    /// Vendor record shape of a canonical instance.
    pub fn to_remote_record(&self, instance: &CanonicalInstance) -> SyncResult<Value> {
        Normalizer::new(&self.definition).to_remote_record(instance)
    }

    /// Deploys one change and verifies convergence.
    pub fn deploy_change(
        &self,
        change: &Change,
        deployer: &dyn FieldGroupDeployer,
        resolver: &dyn ReferenceResolver,
        cancel: &CancellationToken,
    ) -> SyncResult<DeployOutcome> {
        DeployEngine::new(&self.definition, &self.client, resolver)
            .with_backoff(self.config.backoff_policy())
            .deploy(change, deployer, self.config.retry_budget(), cancel)
    }

    fn get_body(&self, path: &str) -> SyncResult<Value> {
        let response = self
            .client
            .get(path)
            .and_then(|response| ensure_success(path, response))?;
        Ok(response.body)
    }
}
