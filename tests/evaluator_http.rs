//! Evaluator integration tests
//!
//! Drives the evaluator over HTTP while it calls real collaborator servers
//! through the reqwest client.

mod common;

use std::time::Duration;

use common::{PipelineOptions, evaluator, http, pipeline};
use serde_json::Value;

#[tokio::test]
async fn test_run_once_end_to_end() {
    let pipeline = pipeline(PipelineOptions::default()).await;
    let (url, controller) = evaluator(&pipeline.config).await;
    let client = http();

    let first: Value = client
        .post(format!("{}/run_once", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = client
        .post(format!("{}/run_once", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["status"], "completed");
    assert_eq!(second["status"], "completed");
    assert_ne!(first["correlation_id"], second["correlation_id"]);

    let updates = pipeline.updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 2);
    let update = &updates[0];
    assert_eq!(update["original_payload"]["input_id"], first["correlation_id"]);
    assert_eq!(update["proposal"]["model_version"], "proposer-v1");
    assert_eq!(update["contradiction"]["saw_features"], true);

    // run_once is not the loop: liveness stays unset
    assert!(controller.last_successful_run().await.is_none());
}

#[tokio::test]
async fn test_run_once_blocked_skips_learner() {
    let pipeline = pipeline(PipelineOptions {
        allow: false,
        ..Default::default()
    })
    .await;
    let (url, _) = evaluator(&pipeline.config).await;

    let resp = http().post(format!("{}/run_once", url)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "blocked_by_safety");
    assert_eq!(body["reason"], "dissonance_too_high");
    assert!(pipeline.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_run_once_past_deadline() {
    let mut pipeline = pipeline(PipelineOptions {
        critic_delay: Duration::from_secs(3),
        ..Default::default()
    })
    .await;
    pipeline.config.loop_config.timeout_seconds = 0.3;
    let (url, _) = evaluator(&pipeline.config).await;

    let resp = http().post(format!("{}/run_once", url)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 504);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "timed_out");
    assert!(pipeline.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_run_once_unreachable_collaborator_fails() {
    let mut pipeline = pipeline(PipelineOptions::default()).await;
    pipeline.config.collaborators.safety_gate_url = common::closed_url().await;
    let (url, _) = evaluator(&pipeline.config).await;

    let resp = http().post(format!("{}/run_once", url)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "failed");
    assert!(body["cause"].as_str().unwrap().contains("/check"));
}

#[tokio::test]
async fn test_background_loop_updates_health() {
    let mut pipeline = pipeline(PipelineOptions::default()).await;
    pipeline.config.loop_config.interval_seconds = 0.05;
    let (url, controller) = evaluator(&pipeline.config).await;
    let client = http();

    let started: Value = client
        .post(format!("{}/start_loop", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(started["status"], "loop_started");

    let mut health = Value::Null;
    for _ in 0..100 {
        health = client
            .get(format!("{}/health", url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if health["last_run_timestamp"].is_string() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(health["last_run_timestamp"].is_string(), "loop never completed: {}", health);
    assert_eq!(health["loop_running"], true);

    controller.shutdown().await;
    assert!(!controller.is_running());
    assert!(!pipeline.updates.lock().unwrap().is_empty());
}
