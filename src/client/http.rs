//! reqwest-backed collaborator client
//!
//! One `HttpCollaboratorClient` is created at process startup and shared by
//! the loop controller and the auditor. Dropping the last handle closes the
//! underlying connection pool.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::client::{ClientError, CollaboratorClient};
use crate::error::{DissonanceError, Result};

/// Shared non-blocking HTTP client
#[derive(Debug, Clone)]
pub struct HttpCollaboratorClient {
    client: Client,
}

impl HttpCollaboratorClient {
    /// Create a new client with a pooled connection manager.
    ///
    /// Collaborators are addressed directly; proxy environment variables are ignored.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .no_proxy()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DissonanceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn send(&self, request: RequestBuilder, url: &str, timeout: Duration) -> std::result::Result<Value, ClientError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| classify(url, timeout, e))?;
        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidPayload {
            url: url.to_string(),
            cause: e.to_string(),
        })
    }
}

#[async_trait]
impl CollaboratorClient for HttpCollaboratorClient {
    async fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> std::result::Result<Value, ClientError> {
        log::debug!("POST {} (timeout {:?})", url, timeout);
        self.send(self.client.post(url).json(payload), url, timeout).await
    }

    async fn get_json(&self, url: &str, timeout: Duration) -> std::result::Result<Value, ClientError> {
        log::debug!("GET {} (timeout {:?})", url, timeout);
        self.send(self.client.get(url), url, timeout).await
    }
}

/// Map a reqwest error onto the deadline / transport split
fn classify(url: &str, timeout: Duration, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout {
            url: url.to_string(),
            after: timeout,
        }
    } else {
        ClientError::Unreachable {
            url: url.to_string(),
            cause: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_new() {
        assert!(HttpCollaboratorClient::new().is_ok());
    }

    #[tokio::test]
    async fn test_get_json_unreachable() {
        let client = HttpCollaboratorClient::new().unwrap();
        // Port 9 (discard) on localhost is not expected to be listening
        let err = client
            .get_json("http://127.0.0.1:9/health", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
