//! Liveness probe - staleness verdict for the evaluator's background loop.
//!
//! The loop reports the end of its last live cycle as `last_run_timestamp`
//! on `/health`. A probe that cannot reach the loop says nothing here; the
//! health probe already reports unreachable services.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::client::CollaboratorClient;
use crate::domain::{Finding, FindingCode};

/// Field carrying the loop's last successful run
pub const LAST_RUN_FIELD: &str = "last_run_timestamp";

/// Older camelCase spelling, still accepted
const LAST_RUN_FIELD_ALIAS: &str = "lastRunTimestamp";

/// Probes a loop's health endpoint and judges whether it is stuck
pub struct LivenessProbe<C: CollaboratorClient> {
    client: Arc<C>,
    timeout: Duration,
    threshold: Duration,
}

impl<C: CollaboratorClient> LivenessProbe<C> {
    pub fn new(client: Arc<C>, timeout: Duration, threshold: Duration) -> Self {
        Self {
            client,
            timeout,
            threshold,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Fetch `url` and assess the reported timestamp against the threshold
    pub async fn check(&self, url: &str) -> Option<Finding> {
        match self.client.get_json(url, self.timeout).await {
            Ok(health) => assess_liveness(&health, Utc::now(), self.threshold),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Liveness probe got no answer");
                None
            }
        }
    }
}

/// Pure liveness verdict over a `/health` body
pub fn assess_liveness(health: &Value, now: DateTime<Utc>, threshold: Duration) -> Option<Finding> {
    let fields = health.as_object()?;
    let raw = fields.get(LAST_RUN_FIELD).or_else(|| fields.get(LAST_RUN_FIELD_ALIAS));

    let last_run = match raw {
        None | Some(Value::Null) => {
            return Some(Finding::new(
                FindingCode::EvaluatorNotRun,
                "evaluator loop has not completed a cycle yet",
            ));
        }
        Some(Value::String(s)) => match parse_timestamp(s) {
            Some(ts) => ts,
            None => {
                return Some(Finding::new(
                    FindingCode::EvaluatorTimestampInvalid,
                    format!("evaluator reported an unparseable {}: {:?}", LAST_RUN_FIELD, s),
                ));
            }
        },
        Some(other) => {
            return Some(Finding::new(
                FindingCode::EvaluatorTimestampInvalid,
                format!("evaluator reported a non-string {}: {}", LAST_RUN_FIELD, other),
            ));
        }
    };

    // A timestamp from the future means the loop is fresh
    let elapsed = (now - last_run).to_std().ok()?;
    if elapsed > threshold {
        return Some(Finding::new(
            FindingCode::EvaluatorStuck,
            format!(
                "evaluator loop last completed {:.1}s ago, over the {:.1}s threshold",
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            ),
        ));
    }
    None
}

/// RFC 3339, or a naive ISO-8601 datetime read as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
