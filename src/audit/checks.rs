//! Individual audit checks.
//!
//! Each check turns one observation (a file lookup or one probe response)
//! into zero or one [`Finding`]. None of them perform I/O over the network.

use std::path::Path;

use serde_json::Value;

use crate::client::ClientError;
use crate::config::ModelArtifact;
use crate::domain::{Finding, FindingCode};

/// Outcome of one probe call, consumed right away
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    Ok(Value),
    HttpError { status: u16 },
    Unreachable { cause: String },
    UnexpectedPayload { cause: String },
}

impl From<Result<Value, ClientError>> for ProbeResult {
    fn from(result: Result<Value, ClientError>) -> Self {
        match result {
            Ok(body) => ProbeResult::Ok(body),
            Err(e) => match e.status() {
                Some(status) => ProbeResult::HttpError { status },
                None if e.is_transport() => ProbeResult::Unreachable { cause: e.to_string() },
                None => ProbeResult::UnexpectedPayload { cause: e.to_string() },
            },
        }
    }
}

/// `MODEL_FILE_MISSING` when the artifact's file does not exist
pub fn check_model_artifact(artifact: &ModelArtifact) -> Option<Finding> {
    if Path::new(&artifact.path).exists() {
        return None;
    }
    Some(Finding::new(
        FindingCode::ModelFileMissing,
        format!("{} model file not found at {}", artifact.name, artifact.path.display()),
    ))
}

/// Verdict over one `/health` probe
pub fn assess_health(name: &str, result: ProbeResult) -> Option<Finding> {
    match result {
        ProbeResult::Ok(body) => {
            let Some(fields) = body.as_object() else {
                return Some(Finding::new(
                    FindingCode::ServiceHealthCheckFailed,
                    format!("{} health response is not a JSON object: {}", name, body),
                ));
            };
            match fields.get("status").and_then(Value::as_str) {
                Some("ok") => None,
                Some(status) => Some(Finding::new(
                    FindingCode::ServiceUnhealthy,
                    format!("{} reported status {:?}", name, status),
                )),
                None => Some(Finding::new(
                    FindingCode::ServiceUnhealthy,
                    format!("{} health response has no status", name),
                )),
            }
        }
        ProbeResult::HttpError { status } => Some(Finding::new(
            FindingCode::ServiceUnhealthy,
            format!("{} health check returned HTTP {}", name, status),
        )),
        ProbeResult::Unreachable { cause } => Some(Finding::new(
            FindingCode::ServiceUnreachable,
            format!("{} is unreachable: {}", name, cause),
        )),
        ProbeResult::UnexpectedPayload { cause } => Some(Finding::new(
            FindingCode::ServiceHealthCheckFailed,
            format!("{} health check failed: {}", name, cause),
        )),
    }
}

/// Verdict over one `/config` probe. Only an empty object is flagged.
pub fn assess_config(name: &str, result: ProbeResult, config_less: Option<&str>) -> Option<Finding> {
    let ProbeResult::Ok(Value::Object(fields)) = result else {
        return None;
    };
    if fields.is_empty() && config_less != Some(name) {
        return Some(Finding::new(
            FindingCode::ConfigEmpty,
            format!("{} returned an empty config", name),
        ));
    }
    None
}
