//! Scripted in-memory collaborator client
//!
//! Routes are keyed by full URL. Each call is recorded before any scripted
//! delay, so call counts reflect attempts, not completions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ClientError, CollaboratorClient};

/// What a mocked route answers with
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Error(ClientError),
}

#[derive(Debug, Clone)]
struct MockRoute {
    reply: MockReply,
    delay: Duration,
}

/// Mock collaborator client for tests and dry runs
#[derive(Debug, Default)]
pub struct MockCollaboratorClient {
    routes: Mutex<HashMap<String, MockRoute>>,
    calls: Mutex<HashMap<String, usize>>,
    payloads: Mutex<HashMap<String, Vec<Value>>>,
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockCollaboratorClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with a JSON body
    pub fn with_json(self, url: impl Into<String>, body: Value) -> Self {
        self.set_reply(url, MockReply::Json(body));
        self
    }

    /// Answer `url` with an error
    pub fn with_error(self, url: impl Into<String>, err: ClientError) -> Self {
        self.set_reply(url, MockReply::Error(err));
        self
    }

    /// Delay every answer on `url`; an unknown route is created as unreachable
    pub fn with_delay(self, url: impl Into<String>, delay: Duration) -> Self {
        let url = url.into();
        let mut routes = guard(&self.routes);
        let route = routes.entry(url.clone()).or_insert_with(|| MockRoute {
            reply: MockReply::Error(no_route(&url)),
            delay: Duration::ZERO,
        });
        route.delay = delay;
        drop(routes);
        self
    }

    /// Replace the reply for `url`, keeping any delay
    pub fn set_reply(&self, url: impl Into<String>, reply: MockReply) {
        let mut routes = guard(&self.routes);
        routes
            .entry(url.into())
            .and_modify(|r| r.reply = reply.clone())
            .or_insert(MockRoute {
                reply,
                delay: Duration::ZERO,
            });
    }

    /// Number of calls made to `url`
    pub fn call_count(&self, url: &str) -> usize {
        guard(&self.calls).get(url).copied().unwrap_or(0)
    }

    /// Payloads POSTed to `url`, oldest first
    pub fn payloads(&self, url: &str) -> Vec<Value> {
        guard(&self.payloads).get(url).cloned().unwrap_or_default()
    }

    async fn answer(&self, url: &str, payload: Option<&Value>, timeout: Duration) -> Result<Value, ClientError> {
        *guard(&self.calls).entry(url.to_string()).or_insert(0) += 1;
        if let Some(payload) = payload {
            guard(&self.payloads)
                .entry(url.to_string())
                .or_default()
                .push(payload.clone());
        }

        let route = guard(&self.routes).get(url).cloned();
        let Some(route) = route else {
            return Err(no_route(url));
        };

        if route.delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(ClientError::Timeout {
                url: url.to_string(),
                after: timeout,
            });
        }
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        match route.reply {
            MockReply::Json(body) => Ok(body),
            MockReply::Error(err) => Err(err),
        }
    }
}

fn no_route(url: &str) -> ClientError {
    ClientError::Unreachable {
        url: url.to_string(),
        cause: "no mock route".to_string(),
    }
}

#[async_trait]
impl CollaboratorClient for MockCollaboratorClient {
    async fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> Result<Value, ClientError> {
        self.answer(url, Some(payload), timeout).await
    }

    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, ClientError> {
        self.answer(url, None, timeout).await
    }
}
