//! Auditor HTTP surface

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::audit::{AuditSettings, SystemAuditor};
use crate::client::CollaboratorClient;
use crate::domain::Finding;

/// `POST /audit` body. Always returned with 200, whatever the findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub status: String,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn completed(findings: Vec<Finding>) -> Self {
        Self {
            status: "completed".to_string(),
            findings,
        }
    }
}

pub fn router<C: CollaboratorClient + 'static>(auditor: Arc<SystemAuditor<C>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(config::<C>))
        .route("/audit", post(audit::<C>))
        .with_state(auditor)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn config<C: CollaboratorClient + 'static>(State(auditor): State<Arc<SystemAuditor<C>>>) -> Json<AuditSettings> {
    Json(auditor.settings())
}

async fn audit<C: CollaboratorClient + 'static>(State(auditor): State<Arc<SystemAuditor<C>>>) -> Json<AuditReport> {
    Json(AuditReport::completed(auditor.run_audit().await))
}
