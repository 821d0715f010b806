//! Remote client seam.
//!
//! The transport (auth, timeouts, connection retry) lives outside this crate;
//! the core only sees raw bodies or transport errors.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw response returned by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// Transport-level failure. Never retried by the converge loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Network(String),
    Auth(String),
    /// HTTP status >= 400.
    Status { status: u16, path: String },
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Auth(message) => write!(f, "authentication error: {message}"),
            Self::Status { status, path } => {
                write!(f, "remote returned status {status} for `{path}`")
            }
        }
    }
}

impl Error for TransportError {}

/// Authenticated request capability against one vendor API.
///
/// Calls block the calling thread until a response or a transport fault.
/// Implementations must be shareable across threads so deploys for
/// different identities can run concurrently.
pub trait RemoteClient: Send + Sync {
    fn get(&self, path: &str) -> Result<RawResponse, TransportError>;
    fn put(&self, path: &str, body: &Value) -> Result<RawResponse, TransportError>;
    fn post(&self, path: &str, body: &Value) -> Result<RawResponse, TransportError>;
}

/// Maps status >= 400 to `TransportError::Status`.
pub fn ensure_success(path: &str, response: RawResponse) -> Result<RawResponse, TransportError> {
    if response.status >= 400 {
        return Err(TransportError::Status {
            status: response.status,
            path: path.to_string(),
        });
    }
    Ok(response)
}
