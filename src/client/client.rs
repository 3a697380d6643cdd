//! Collaborator client trait and error taxonomy

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Single-shot JSON client for collaborator services.
///
/// Each call carries its own timeout. Implementations never retry; retry
/// policy belongs to the caller.
#[async_trait]
pub trait CollaboratorClient: Send + Sync {
    /// POST `payload` as JSON and decode the JSON response body
    async fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> Result<Value, ClientError>;

    /// GET and decode the JSON response body
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, ClientError>;
}

/// Errors that can occur during a collaborator call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, reset mid-body
    #[error("{url} unreachable: {cause}")]
    Unreachable { url: String, cause: String },

    /// Collaborator answered with a non-2xx status
    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    /// Call exceeded its own timeout
    #[error("{url} timed out after {}s", after.as_secs_f64())]
    Timeout { url: String, after: Duration },

    /// 2xx response whose body is not JSON
    #[error("{url} returned an unexpected payload: {cause}")]
    InvalidPayload { url: String, cause: String },
}

impl ClientError {
    /// Network-level failure: the collaborator could not be talked to at all
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Unreachable { .. } | ClientError::Timeout { .. })
    }

    /// HTTP status, if the collaborator answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
