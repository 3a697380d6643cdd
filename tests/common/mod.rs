//! Shared fixtures: collaborator services served by axum on ephemeral ports

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

use dissonance::client::HttpCollaboratorClient;
use dissonance::config::Config;
use dissonance::orchestrator::LoopController;
use dissonance::server::{EvaluatorState, evaluator};

/// Bodies a collaborator received, oldest first
pub type Recorder = Arc<Mutex<Vec<Value>>>;

pub fn http() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Serve `router` on 127.0.0.1 and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL nothing listens on
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// `/health` answering ok and `/config` answering `config`
pub fn service(config: Value) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/config", get(move || async move { Json(config) }))
}

/// A service whose `/health` answers 503
pub fn unhealthy_service() -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "loading"}))) }),
        )
        .route("/config", get(|| async { Json(json!({"model": "v1"})) }))
}

pub fn proposer() -> Router {
    service(json!({"model_path": "/app/models/proposer.pkl"})).route(
        "/predict",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "input_id": body["input_id"],
                "predictions": [{"class": "A", "p": 0.4}, {"class": "B", "p": 0.6}],
                "model_version": "proposer-v1"
            }))
        }),
    )
}

/// Critic that waits `delay` before answering
pub fn critic(delay: Duration) -> Router {
    service(json!({"model_path": "/app/models/critic.pkl"})).route(
        "/contradict",
        post(move |Json(body): Json<Value>| async move {
            tokio::time::sleep(delay).await;
            Json(json!({
                "input_id": body["input_id"],
                "contradictory": [{"class": "A", "p": 0.65}, {"class": "B", "p": 0.35}],
                "critic_version": "critic-v1",
                "saw_features": body.get("features").is_some(),
                "d": 0.25
            }))
        }),
    )
}

pub fn safety_gate(allow: bool) -> Router {
    service(json!({"max_dissonance": 0.5})).route(
        "/check",
        post(move |Json(_): Json<Value>| async move {
            if allow {
                Json(json!({"allow": true}))
            } else {
                Json(json!({"allow": false, "reason": "dissonance_too_high"}))
            }
        }),
    )
}

/// Learner recording every update; its config is legitimately empty
pub fn learner(updates: Recorder) -> Router {
    service(json!({})).route(
        "/update",
        post(move |Json(body): Json<Value>| {
            let updates = updates.clone();
            async move {
                updates.lock().unwrap().push(body);
                Json(json!({"status": "updated", "loss": 0.0625}))
            }
        }),
    )
}

/// A running set of collaborators plus the config pointing at them
pub struct Pipeline {
    pub config: Config,
    pub updates: Recorder,
    /// Holds the model files the auditor looks for
    pub models: TempDir,
}

pub struct PipelineOptions {
    pub allow: bool,
    pub critic_delay: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            allow: true,
            critic_delay: Duration::ZERO,
        }
    }
}

/// Spawn proposer, critic, safety gate, learner and meta-controller
pub async fn pipeline(options: PipelineOptions) -> Pipeline {
    let updates: Recorder = Arc::default();
    let models = TempDir::new().unwrap();

    let mut config = Config::default();
    config.collaborators.proposer_url = serve(proposer()).await;
    config.collaborators.critic_url = serve(critic(options.critic_delay)).await;
    config.collaborators.safety_gate_url = serve(safety_gate(options.allow)).await;
    config.collaborators.learner_url = serve(learner(updates.clone())).await;
    config.collaborators.meta_controller_url = serve(service(json!({"policy": "default"}))).await;
    for artifact in config.audit.model_artifacts.iter_mut() {
        let path = models.path().join(format!("{}.pkl", artifact.name));
        std::fs::write(&path, b"model").unwrap();
        artifact.path = path;
    }

    Pipeline {
        config,
        updates,
        models,
    }
}

/// Serve the real evaluator against `config`'s collaborators
pub async fn evaluator(config: &Config) -> (String, Arc<LoopController<HttpCollaboratorClient>>) {
    let client = Arc::new(HttpCollaboratorClient::new().unwrap());
    let controller = Arc::new(LoopController::new(client, config));
    let state = Arc::new(EvaluatorState {
        controller: controller.clone(),
        collaborators: config.collaborators.clone(),
    });
    let url = serve(evaluator::router(state)).await;
    (url, controller)
}
