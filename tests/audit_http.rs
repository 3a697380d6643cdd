//! Auditor integration tests
//!
//! The auditor probes real collaborator servers, including a live evaluator
//! whose loop state drives the liveness verdict.

mod common;

use std::sync::Arc;

use common::{PipelineOptions, closed_url, evaluator, http, pipeline, serve, unhealthy_service};
use dissonance::audit::SystemAuditor;
use dissonance::client::HttpCollaboratorClient;
use dissonance::config::Config;
use dissonance::domain::FindingCode;
use dissonance::server::{AuditReport, auditor};

async fn audit(config: &Config) -> AuditReport {
    let client = Arc::new(HttpCollaboratorClient::new().unwrap());
    let url = serve(auditor::router(Arc::new(SystemAuditor::new(client, config)))).await;

    let resp = http().post(format!("{}/audit", url)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let report: AuditReport = resp.json().await.unwrap();
    assert_eq!(report.status, "completed");
    report
}

#[tokio::test]
async fn test_audit_all_healthy() {
    let mut pipeline = pipeline(PipelineOptions::default()).await;
    let (url, controller) = evaluator(&pipeline.config).await;
    pipeline.config.collaborators.evaluator_url = url;
    controller.tick().await;

    let report = audit(&pipeline.config).await;
    assert!(report.findings.is_empty(), "{:?}", report.findings);
}

#[tokio::test]
async fn test_audit_loop_not_run() {
    let mut pipeline = pipeline(PipelineOptions::default()).await;
    let (url, _) = evaluator(&pipeline.config).await;
    pipeline.config.collaborators.evaluator_url = url;

    let report = audit(&pipeline.config).await;
    assert_eq!(report.findings.len(), 1, "{:?}", report.findings);
    assert_eq!(report.findings[0].id(), FindingCode::EvaluatorNotRun);
}

#[tokio::test]
async fn test_audit_one_unhealthy_service() {
    let mut pipeline = pipeline(PipelineOptions::default()).await;
    pipeline.config.collaborators.meta_controller_url = serve(unhealthy_service()).await;
    let (url, controller) = evaluator(&pipeline.config).await;
    pipeline.config.collaborators.evaluator_url = url;
    controller.tick().await;

    let report = audit(&pipeline.config).await;
    assert_eq!(report.findings.len(), 1, "{:?}", report.findings);
    assert_eq!(report.findings[0].id(), FindingCode::ServiceUnhealthy);
    assert!(report.findings[0].detail().contains("meta-controller"));
    assert!(report.findings[0].detail().contains("503"));
}

#[tokio::test]
async fn test_audit_unreachable_service_and_empty_config() {
    let mut pipeline = pipeline(PipelineOptions::default()).await;
    let (url, controller) = evaluator(&pipeline.config).await;
    pipeline.config.collaborators.evaluator_url = url;
    controller.tick().await;

    pipeline.config.collaborators.critic_url = closed_url().await;
    pipeline.config.collaborators.meta_controller_url = serve(common::service(serde_json::json!({}))).await;

    let report = audit(&pipeline.config).await;
    let ids: Vec<FindingCode> = report.findings.iter().map(|f| f.id()).collect();
    assert_eq!(ids, vec![FindingCode::ServiceUnreachable, FindingCode::ConfigEmpty]);
    assert!(report.findings[0].detail().starts_with("critic"));
    assert!(report.findings[1].detail().starts_with("meta-controller"));
}

#[tokio::test]
async fn test_audit_missing_model_file() {
    let mut pipeline = pipeline(PipelineOptions::default()).await;
    let (url, controller) = evaluator(&pipeline.config).await;
    pipeline.config.collaborators.evaluator_url = url;
    controller.tick().await;
    std::fs::remove_file(&pipeline.config.audit.model_artifacts[0].path).unwrap();

    let report = audit(&pipeline.config).await;
    assert_eq!(report.findings.len(), 1, "{:?}", report.findings);
    assert_eq!(report.findings[0].id(), FindingCode::ModelFileMissing);
    assert!(report.findings[0].detail().starts_with("proposer"));
}
