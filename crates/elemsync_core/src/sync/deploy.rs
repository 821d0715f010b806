//! Deploy-converge engine.
//!
//! # Responsibility
//! - Apply one change to the remote system through a field-group deployer.
//! - Re-read the remote confirmation and compare it with the intended value.
//! - Retry verification mismatches within a bounded budget.
//!
//! # Invariants
//! - A modification whose deployed field group is unchanged issues no write.
//! - At most `budget + 1` writes happen per deploy invocation.
//! - Reference, transport and guard failures end the invocation at once.
//! - Cancellation is only observed between attempts.

use crate::adapters::definition::AdapterDefinition;
use crate::error::{join_values, SyncError, SyncResult};
use crate::model::change::Change;
use crate::model::instance::CanonicalInstance;
use crate::sync::client::{ensure_success, RemoteClient};
use crate::sync::guard::{ResponseShape, ValidatedShape};
use crate::sync::reference::ReferenceResolver;
use log::{error, info, warn};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Converts one field group of an instance to and from the vendor write API.
pub trait FieldGroupDeployer: Send + Sync {
    /// Top-level field this deployer owns, e.g. `columnConfig`.
    fn field_group(&self) -> &str;

    /// Remote path written with `put`.
    fn write_path(&self) -> &str;

    /// Builds the write payload from a resolved instance.
    fn build_payload(&self, instance: &CanonicalInstance) -> SyncResult<Value>;

    /// Shape the write response must have before it is read.
    fn response_shape(&self) -> &ResponseShape;

    /// Ordered entries the write intends the remote to hold.
    fn intended_entries(&self, instance: &CanonicalInstance) -> SyncResult<Vec<Value>>;

    /// Ordered entries the remote confirms, before edge-policy stripping.
    fn confirmed_entries(&self, response: &ValidatedShape<'_>) -> SyncResult<Vec<Value>>;
}

/// Result of a successful deploy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Field group unchanged; nothing was written.
    Unchanged,
    /// Remote confirmed the intended value after `attempts` writes.
    Converged { attempts: u32 },
}

/// Remaining verification retries of one deploy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl RetryBudget {
    pub fn new(retries: u32) -> Self {
        Self { remaining: retries }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consumes one retry; false once exhausted.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Exponential delay inserted between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: u32,
}

impl BackoffPolicy {
    pub fn none() -> Self {
        Self {
            initial: Duration::ZERO,
            max: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Delay before retry number `retry` (0-based), capped at `max`.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(retry);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(8),
            multiplier: 2,
        }
    }
}

/// Cooperative cancellation shared between a caller and running deploys.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Stateless engine; safe to share across threads deploying different
/// identities. Deploys of one identity must be serialized by the caller.
pub struct DeployEngine<'a> {
    definition: &'a AdapterDefinition,
    client: &'a dyn RemoteClient,
    resolver: &'a dyn ReferenceResolver,
    backoff: BackoffPolicy,
}

impl<'a> DeployEngine<'a> {
    pub fn new(
        definition: &'a AdapterDefinition,
        client: &'a dyn RemoteClient,
        resolver: &'a dyn ReferenceResolver,
    ) -> Self {
        Self {
            definition,
            client,
            resolver,
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Deploys one change and waits for the remote to confirm it.
    ///
    /// # Errors
    /// - `UnresolvedReference` before any write.
    /// - `Transport` / `InvalidRemoteResponse` on the first such failure.
    /// - `DeployFailed` once `budget` is exhausted on mismatches.
    /// - `Cancelled` when `cancel` fires between attempts.
    pub fn deploy(
        &self,
        change: &Change,
        deployer: &dyn FieldGroupDeployer,
        mut budget: RetryBudget,
        cancel: &CancellationToken,
    ) -> SyncResult<DeployOutcome> {
        let deploy_id = Uuid::new_v4();
        let instance_name = change.data().full_name();
        let group = deployer.field_group();
        let mut attempts: u32 = 0;

        loop {
            let after = self.resolver.resolve(change.data())?;
            if let Some(before) = change.before() {
                let before = self.resolver.resolve(before)?;
                if before.get(group) == after.get(group) {
                    info!(
                        "event=deploy module=deploy status=unchanged deploy_id={} instance={} group={}",
                        deploy_id, instance_name, group
                    );
                    return Ok(DeployOutcome::Unchanged);
                }
            }

            attempts += 1;
            let expected = deployer.intended_entries(&after)?;
            let actual = self.write_and_confirm(deployer, &after)?;

            if expected == actual {
                info!(
                    "event=deploy module=deploy status=converged deploy_id={} instance={} group={} attempts={}",
                    deploy_id, instance_name, group, attempts
                );
                return Ok(DeployOutcome::Converged { attempts });
            }

            warn!(
                "event=deploy_verify module=deploy status=mismatch deploy_id={} instance={} group={} attempt={} retries_left={} expected=[{}] actual=[{}]",
                deploy_id,
                instance_name,
                group,
                attempts,
                budget.remaining(),
                join_values(&expected),
                join_values(&actual)
            );
            if !budget.try_consume() {
                error!(
                    "event=deploy module=deploy status=failed deploy_id={} instance={} attempts={}",
                    deploy_id, instance_name, attempts
                );
                return Err(SyncError::DeployFailed {
                    instance: instance_name,
                    expected,
                    actual,
                    attempts,
                });
            }

            self.pause_before_retry(attempts - 1, cancel, &instance_name)?;
        }
    }

    fn write_and_confirm(
        &self,
        deployer: &dyn FieldGroupDeployer,
        instance: &CanonicalInstance,
    ) -> SyncResult<Vec<Value>> {
        let path = deployer.write_path();
        let payload = deployer.build_payload(instance)?;
        let response = self
            .client
            .put(path, &payload)
            .and_then(|response| ensure_success(path, response))?;

        let validated = deployer
            .response_shape()
            .validate(&response.body)
            .map_err(|err| match err {
                SyncError::InvalidRemoteResponse { message, payload } => {
                    SyncError::InvalidRemoteResponse {
                        message: format!(
                            "{message} while updating `{}` of {}",
                            deployer.field_group(),
                            instance.full_name()
                        ),
                        payload,
                    }
                }
                other => other,
            })?;

        let mut confirmed = deployer.confirmed_entries(&validated)?;
        if let Some(policy) = self.definition.list_policy(&instance.type_name) {
            policy.strip_confirmed(&instance.value, &mut confirmed);
        }
        Ok(confirmed)
    }

    fn pause_before_retry(
        &self,
        retry: u32,
        cancel: &CancellationToken,
        instance_name: &str,
    ) -> SyncResult<()> {
        let cancelled = || SyncError::Cancelled {
            instance: instance_name.to_string(),
        };
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let delay = self.backoff.delay_before_retry(retry);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        Ok(())
    }
}
