//! Evaluator HTTP surface - drives and reports on the orchestration loop

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CollaboratorClient;
use crate::config::CollaboratorsConfig;
use crate::domain::CycleOutcome;
use crate::orchestrator::{LoopController, LoopStatsSnapshot};

/// Shared state behind every evaluator handler
pub struct EvaluatorState<C: CollaboratorClient + 'static> {
    pub controller: Arc<LoopController<C>>,
    pub collaborators: CollaboratorsConfig,
}

/// `GET /health` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorHealth {
    pub status: String,
    pub last_run_timestamp: Option<DateTime<Utc>>,
    pub loop_running: bool,
    pub stats: LoopStatsSnapshot,
}

/// `GET /config` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfigView {
    pub proposer_url: String,
    pub critic_url: String,
    pub safety_gate_url: String,
    pub learner_url: String,
    pub loop_timeout_seconds: f64,
    pub loop_interval_seconds: f64,
}

/// `POST /start_loop` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartLoopResponse {
    pub status: String,
}

pub fn router<C: CollaboratorClient + 'static>(state: Arc<EvaluatorState<C>>) -> Router {
    Router::new()
        .route("/run_once", post(run_once::<C>))
        .route("/start_loop", post(start_loop::<C>))
        .route("/health", get(health::<C>))
        .route("/config", get(config::<C>))
        .route("/metrics", get(metrics::<C>))
        .with_state(state)
}

/// HTTP status for a `/run_once` outcome; the body is always the outcome
fn outcome_status(outcome: &CycleOutcome) -> StatusCode {
    match outcome {
        CycleOutcome::Completed { .. } | CycleOutcome::BlockedBySafety { .. } => StatusCode::OK,
        CycleOutcome::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        CycleOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
    }
}

async fn run_once<C: CollaboratorClient + 'static>(
    State(state): State<Arc<EvaluatorState<C>>>,
) -> (StatusCode, Json<CycleOutcome>) {
    let outcome = state.controller.run_once().await;
    tracing::info!(outcome = outcome.label(), "run_once finished");
    (outcome_status(&outcome), Json(outcome))
}

async fn start_loop<C: CollaboratorClient + 'static>(
    State(state): State<Arc<EvaluatorState<C>>>,
) -> Json<StartLoopResponse> {
    let status = if state.controller.start() {
        "loop_started"
    } else {
        "already_running"
    };
    Json(StartLoopResponse {
        status: status.to_string(),
    })
}

async fn health<C: CollaboratorClient + 'static>(State(state): State<Arc<EvaluatorState<C>>>) -> Json<EvaluatorHealth> {
    Json(EvaluatorHealth {
        status: "ok".to_string(),
        last_run_timestamp: state.controller.last_successful_run().await,
        loop_running: state.controller.is_running(),
        stats: state.controller.stats(),
    })
}

async fn config<C: CollaboratorClient + 'static>(
    State(state): State<Arc<EvaluatorState<C>>>,
) -> Json<EvaluatorConfigView> {
    let loop_config = state.controller.loop_config();
    Json(EvaluatorConfigView {
        proposer_url: state.collaborators.proposer_url.clone(),
        critic_url: state.collaborators.critic_url.clone(),
        safety_gate_url: state.collaborators.safety_gate_url.clone(),
        learner_url: state.collaborators.learner_url.clone(),
        loop_timeout_seconds: loop_config.timeout_seconds,
        loop_interval_seconds: loop_config.interval_seconds,
    })
}

async fn metrics<C: CollaboratorClient + 'static>(
    State(state): State<Arc<EvaluatorState<C>>>,
) -> Json<LoopStatsSnapshot> {
    Json(state.controller.stats())
}
