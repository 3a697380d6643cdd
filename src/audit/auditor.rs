//! System auditor - concurrent fan-out of health, config and liveness probes.
//!
//! Every probe is spawned at once and bounded by its own timeout; the audit
//! waits for all of them and never retries. Dropping an audit midway aborts
//! the probes still in flight. Findings come back in a fixed
//! order: local model checks, health (descriptor order), config (descriptor
//! order), then liveness.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::task::{JoinError, JoinHandle};

use crate::audit::checks::{ProbeResult, assess_config, assess_health, check_model_artifact};
use crate::client::CollaboratorClient;
use crate::config::{Config, ModelArtifact};
use crate::domain::collaborator::EVALUATOR;
use crate::domain::{CollaboratorDescriptor, Finding, FindingCode};
use crate::liveness::LivenessProbe;

/// Static audit settings, exposed on the auditor's `/config`
#[derive(Debug, Clone, Serialize)]
pub struct AuditSettings {
    pub collaborators: Vec<CollaboratorDescriptor>,
    pub model_artifacts: Vec<ModelArtifact>,
    pub config_less_collaborator: Option<String>,
    pub probe_timeout_seconds: f64,
    pub stuck_threshold_seconds: f64,
    pub liveness_url: String,
}

/// Spawned probe, aborted when dropped before it completes
struct ProbeTask<T>(JoinHandle<T>);

impl<T> ProbeTask<T> {
    fn spawn<F>(probe: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Self(tokio::spawn(probe))
    }
}

impl<T> Future for ProbeTask<T> {
    type Output = std::result::Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for ProbeTask<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs audits against a fixed collaborator set
pub struct SystemAuditor<C: CollaboratorClient + 'static> {
    client: Arc<C>,
    descriptors: Vec<CollaboratorDescriptor>,
    model_artifacts: Vec<ModelArtifact>,
    config_less: Option<String>,
    probe_timeout: Duration,
    liveness: LivenessProbe<C>,
    liveness_url: String,
}

impl<C: CollaboratorClient + 'static> SystemAuditor<C> {
    pub fn new(client: Arc<C>, config: &Config) -> Self {
        let descriptors = config.collaborators.descriptors();
        let liveness_url = descriptors
            .iter()
            .find(|d| d.name() == EVALUATOR)
            .map(|d| d.health_url().to_string())
            .unwrap_or_default();
        let probe_timeout = config.audit.probe_timeout();

        Self {
            liveness: LivenessProbe::new(client.clone(), probe_timeout, config.stuck_threshold()),
            client,
            descriptors,
            model_artifacts: config.audit.model_artifacts.clone(),
            config_less: config.audit.config_less_collaborator.clone(),
            probe_timeout,
            liveness_url,
        }
    }

    pub fn settings(&self) -> AuditSettings {
        AuditSettings {
            collaborators: self.descriptors.clone(),
            model_artifacts: self.model_artifacts.clone(),
            config_less_collaborator: self.config_less.clone(),
            probe_timeout_seconds: self.probe_timeout.as_secs_f64(),
            stuck_threshold_seconds: self.liveness.threshold().as_secs_f64(),
            liveness_url: self.liveness_url.clone(),
        }
    }

    /// Run every check and return the ordered findings
    pub async fn run_audit(&self) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self.model_artifacts.iter().filter_map(check_model_artifact).collect();

        let (health, config, liveness) = tokio::join!(
            self.probe_health(),
            self.probe_config(),
            self.liveness.check(&self.liveness_url),
        );
        findings.extend(health);
        findings.extend(config);
        findings.extend(liveness);

        tracing::info!(
            findings = findings.len(),
            collaborators = self.descriptors.len(),
            "Audit completed"
        );
        findings
    }

    async fn probe_health(&self) -> Vec<Finding> {
        let handles: Vec<ProbeTask<Option<Finding>>> = self
            .descriptors
            .iter()
            .map(|d| {
                let client = self.client.clone();
                let name = d.name().to_string();
                let url = d.health_url().to_string();
                let timeout = self.probe_timeout;
                ProbeTask::spawn(async move {
                    let result = ProbeResult::from(client.get_json(&url, timeout).await);
                    let finding = assess_health(&name, result);
                    if let Some(f) = &finding {
                        tracing::warn!(collaborator = %name, finding = %f, "Health probe flagged");
                    }
                    finding
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(&self.descriptors)
            .filter_map(|(joined, d)| match joined {
                Ok(finding) => finding,
                Err(e) => Some(Finding::new(
                    FindingCode::ServiceHealthCheckFailed,
                    format!("{} health check failed: {}", d.name(), e),
                )),
            })
            .collect()
    }

    async fn probe_config(&self) -> Vec<Finding> {
        let handles: Vec<ProbeTask<Option<Finding>>> = self
            .descriptors
            .iter()
            .map(|d| {
                let client = self.client.clone();
                let name = d.name().to_string();
                let url = d.config_url().to_string();
                let timeout = self.probe_timeout;
                let config_less = self.config_less.clone();
                ProbeTask::spawn(async move {
                    let result = client.get_json(&url, timeout).await;
                    if let Err(e) = &result {
                        tracing::debug!(collaborator = %name, error = %e, "Config probe got no answer");
                    }
                    assess_config(&name, result.into(), config_less.as_deref())
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(&self.descriptors)
            .filter_map(|(joined, d)| match joined {
                Ok(finding) => finding,
                Err(e) => {
                    tracing::error!(collaborator = %d.name(), error = ?e, "Config probe task panicked");
                    None
                }
            })
            .collect()
    }
}
