//! Cycle executor - one proposer → critic → safety gate → learner pass.
//!
//! Steps run strictly in order and each step's output feeds the next. The
//! safety gate is an early exit, not an error. Any client or payload failure
//! abandons the cycle as `Failed`; nothing here retries.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::client::CollaboratorClient;
use crate::config::CollaboratorsConfig;
use crate::domain::{CycleOutcome, join_url};
use crate::error::{DissonanceError, Result};
use crate::id::{generate_correlation_id, synthetic_features};

/// Reason reported when the gate refuses without giving one
const UNSPECIFIED_REASON: &str = "unspecified";

/// Action endpoints of the four pipeline collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleEndpoints {
    pub proposer: String,
    pub critic: String,
    pub safety_gate: String,
    pub learner: String,
}

impl CycleEndpoints {
    pub fn from_config(config: &CollaboratorsConfig) -> Self {
        Self {
            proposer: join_url(&config.proposer_url, "predict"),
            critic: join_url(&config.critic_url, "contradict"),
            safety_gate: join_url(&config.safety_gate_url, "check"),
            learner: join_url(&config.learner_url, "update"),
        }
    }
}

/// Safety gate verdict. A missing `allow` is a refusal.
#[derive(Debug, Deserialize)]
struct SafetyDecision {
    #[serde(default)]
    allow: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Runs single cycles against the pipeline collaborators
pub struct CycleExecutor<C: CollaboratorClient> {
    client: Arc<C>,
    endpoints: CycleEndpoints,
    call_timeout: Duration,
}

impl<C: CollaboratorClient> CycleExecutor<C> {
    pub fn new(client: Arc<C>, endpoints: CycleEndpoints, call_timeout: Duration) -> Self {
        Self {
            client,
            endpoints,
            call_timeout,
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Run one cycle. Never fails; failures are folded into the outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let correlation_id = generate_correlation_id();
        match self.try_cycle(&correlation_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("[{}] cycle failed: {}", correlation_id, e);
                CycleOutcome::Failed { cause: e.to_string() }
            }
        }
    }

    async fn try_cycle(&self, correlation_id: &str) -> Result<CycleOutcome> {
        let features = synthetic_features();
        let original = json!({
            "input_id": correlation_id,
            "features": features,
        });

        let proposal = self.call(&self.endpoints.proposer, &original).await?;
        log::info!("[{}] stage=proposed", correlation_id);

        let critic_input = merge_features(&proposal, &features)?;
        let contradiction = self.call(&self.endpoints.critic, &critic_input).await?;
        log::info!("[{}] stage=contradicted", correlation_id);

        let verdict = self.call(&self.endpoints.safety_gate, &contradiction).await?;
        let decision: SafetyDecision = serde_json::from_value(verdict)
            .map_err(|e| DissonanceError::Payload(format!("safety gate verdict is malformed: {}", e)))?;
        if !decision.allow {
            let reason = decision.reason.unwrap_or_else(|| UNSPECIFIED_REASON.to_string());
            log::info!("[{}] stage=blocked reason={}", correlation_id, reason);
            return Ok(CycleOutcome::BlockedBySafety { reason });
        }

        let update = json!({
            "proposal": proposal,
            "contradiction": contradiction,
            "original_payload": original,
        });
        self.call(&self.endpoints.learner, &update).await?;
        log::info!("[{}] stage=learned", correlation_id);

        Ok(CycleOutcome::Completed {
            correlation_id: correlation_id.to_string(),
        })
    }

    async fn call(&self, url: &str, payload: &Value) -> Result<Value> {
        Ok(self.client.post_json(url, payload, self.call_timeout).await?)
    }
}

/// Critic input: the proposal with the original features attached
fn merge_features(proposal: &Value, features: &Map<String, Value>) -> Result<Value> {
    let Some(fields) = proposal.as_object() else {
        return Err(DissonanceError::Payload("proposal is not a JSON object".to_string()));
    };
    let mut merged = fields.clone();
    merged.insert("features".to_string(), Value::Object(features.clone()));
    Ok(Value::Object(merged))
}
