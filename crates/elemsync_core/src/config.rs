//! Synchronization settings.
//!
//! # Responsibility
//! - Load retry, backoff, fetch and logging settings from JSON.
//! - Reject inconsistent values before any sync call uses them.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.
//! - `backoff.multiplier >= 1` and `initial_delay_ms <= max_delay_ms`.

use crate::error::{SyncError, SyncResult};
use crate::sync::deploy::{BackoffPolicy, RetryBudget};
use crate::sync::normalize::FetchOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_RETRY_BUDGET: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Verification retries after the first mismatching write.
    pub retry_budget: u32,
    pub backoff: BackoffConfig,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            backoff: BackoffConfig::default(),
            fetch: FetchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        let policy = BackoffPolicy::default();
        Self {
            initial_delay_ms: policy.initial.as_millis() as u64,
            max_delay_ms: policy.max.as_millis() as u64,
            multiplier: policy.multiplier,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub add_namespace_prefix: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute log directory; logging stays off when unset.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

impl SyncConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> SyncResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| SyncError::Config(format!("cannot parse config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            SyncError::Config(format!("cannot read `{}`: {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.backoff.multiplier == 0 {
            return Err(SyncError::Config(
                "backoff.multiplier must be >= 1".to_string(),
            ));
        }
        if self.backoff.initial_delay_ms > self.backoff.max_delay_ms {
            return Err(SyncError::Config(format!(
                "backoff.initial_delay_ms ({}) must be <= backoff.max_delay_ms ({})",
                self.backoff.initial_delay_ms, self.backoff.max_delay_ms
            )));
        }
        Ok(())
    }

    pub fn retry_budget(&self) -> RetryBudget {
        RetryBudget::new(self.retry_budget)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_millis(self.backoff.initial_delay_ms),
            max: Duration::from_millis(self.backoff.max_delay_ms),
            multiplier: self.backoff.multiplier,
        }
    }

    /// Fetch options for one call, carrying the listed namespace prefix.
    pub fn fetch_options(&self, namespace_prefix: Option<&str>) -> FetchOptions {
        FetchOptions {
            add_namespace_prefix: self.fetch.add_namespace_prefix,
            namespace_prefix: namespace_prefix.map(str::to_string),
        }
    }
}
