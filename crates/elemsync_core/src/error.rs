//! Error taxonomy shared by fetch and deploy paths.
//!
//! # Responsibility
//! - Give every failure a stable kind plus enough context (instance full
//!   name, divergent sequences, offending payload) for an operator to
//!   diagnose it without re-running.
//!
//! # Invariants
//! - Only `DeployFailed` produced by a verification mismatch is eligible for
//!   automatic retry, and only inside the converge loop.
//! - `InvalidRemoteResponse` always carries the raw payload it rejected.

use crate::sync::client::TransportError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for synchronization APIs.
pub type SyncResult<T> = Result<T, SyncError>;

/// Max characters of a raw payload rendered into an error message.
const MAX_PAYLOAD_DISPLAY_CHARS: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Canonical instance cannot be built from local data and schema.
    SchemaViolation { type_name: String, message: String },
    /// Required field absent after pruning.
    MissingField { type_name: String, field: String },
    /// Guard rejected a raw payload shape.
    InvalidRemoteResponse { message: String, payload: Value },
    /// Reference resolution failed before any network call.
    UnresolvedReference { instance: String, reference: String },
    /// Remote state did not converge to the intended value.
    DeployFailed {
        instance: String,
        expected: Vec<Value>,
        actual: Vec<Value>,
        attempts: u32,
    },
    /// Transport-level failure reported by the remote client.
    Transport(TransportError),
    /// Caller cancelled the converge loop between attempts.
    Cancelled { instance: String },
    /// Configuration file or value is invalid.
    Config(String),
}

impl SyncError {
    pub(crate) fn schema(type_name: &str, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_response(message: impl Into<String>, payload: &Value) -> Self {
        Self::InvalidRemoteResponse {
            message: message.into(),
            payload: payload.clone(),
        }
    }

    /// Whether the converge loop may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeployFailed { .. })
    }

    /// Stable machine-readable kind used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaViolation { .. } => "schema_violation",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidRemoteResponse { .. } => "invalid_remote_response",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::DeployFailed { .. } => "deploy_failed",
            Self::Transport(_) => "transport",
            Self::Cancelled { .. } => "cancelled",
            Self::Config(_) => "config",
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaViolation { type_name, message } => {
                write!(f, "schema violation for type `{type_name}`: {message}")
            }
            Self::MissingField { type_name, field } => {
                write!(f, "required field `{field}` missing from `{type_name}` record")
            }
            Self::InvalidRemoteResponse { message, payload } => write!(
                f,
                "{message}; payload: {}",
                render_payload(payload, MAX_PAYLOAD_DISPLAY_CHARS)
            ),
            Self::UnresolvedReference {
                instance,
                reference,
            } => write!(f, "unresolved reference `{reference}` in {instance}"),
            Self::DeployFailed {
                instance,
                expected,
                actual,
                attempts,
            } => write!(
                f,
                "failed to deploy {instance} after {attempts} attempt(s): expected [{}], remote has [{}]",
                join_values(expected),
                join_values(actual)
            ),
            Self::Transport(err) => write!(f, "{err}"),
            Self::Cancelled { instance } => write!(f, "deploy of {instance} was cancelled"),
            Self::Config(message) => write!(f, "invalid sync configuration: {message}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for SyncError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

/// Renders values as a comma-separated list, unquoting plain strings.
pub(crate) fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compact JSON rendering capped at `max_chars`.
pub(crate) fn render_payload(payload: &Value, max_chars: usize) -> String {
    let rendered = payload.to_string();
    if rendered.chars().count() <= max_chars {
        return rendered;
    }
    let mut truncated = rendered.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::{join_values, render_payload, SyncError};
    use crate::sync::client::TransportError;
    use serde_json::json;

    #[test]
    fn only_deploy_failed_is_retryable() {
        let mismatch = SyncError::DeployFailed {
            instance: "jira.Board.instance.b".to_string(),
            expected: vec![],
            actual: vec![],
            attempts: 1,
        };
        assert!(mismatch.is_retryable());
        assert!(!SyncError::Config("bad".to_string()).is_retryable());
        assert!(!SyncError::Transport(TransportError::Network("reset".to_string())).is_retryable());
        assert!(!SyncError::invalid_response("bad", &json!({})).is_retryable());
    }

    #[test]
    fn deploy_failed_message_names_instance_and_sequences() {
        let err = SyncError::DeployFailed {
            instance: "jira.Board.instance.team_board".to_string(),
            expected: vec![json!("To Do")],
            actual: vec![json!("Wrong")],
            attempts: 1,
        };
        let message = err.to_string();
        assert!(message.contains("jira.Board.instance.team_board"));
        assert!(message.contains("expected [To Do]"));
        assert!(message.contains("remote has [Wrong]"));
    }

    #[test]
    fn invalid_response_message_includes_payload() {
        let err = SyncError::invalid_response("bad columns response", &json!({"oops": 1}));
        assert!(err.to_string().contains("{\"oops\":1}"));
        assert_eq!(err.code(), "invalid_remote_response");
    }

    #[test]
    fn render_payload_truncates_long_bodies() {
        let rendered = render_payload(&json!({"k": "x".repeat(100)}), 10);
        assert_eq!(rendered.chars().count(), 13);
        assert!(rendered.ends_with("..."));
    }

    #[test]
    fn join_values_unquotes_strings() {
        assert_eq!(join_values(&[json!("a"), json!(2)]), "a, 2");
    }
}
