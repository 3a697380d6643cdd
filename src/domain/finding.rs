//! Audit findings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable finding code, serialized as `SCREAMING_SNAKE_CASE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    ModelFileMissing,
    ServiceUnhealthy,
    ServiceUnreachable,
    ServiceHealthCheckFailed,
    ConfigEmpty,
    EvaluatorNotRun,
    EvaluatorStuck,
    EvaluatorTimestampInvalid,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::ModelFileMissing => "MODEL_FILE_MISSING",
            FindingCode::ServiceUnhealthy => "SERVICE_UNHEALTHY",
            FindingCode::ServiceUnreachable => "SERVICE_UNREACHABLE",
            FindingCode::ServiceHealthCheckFailed => "SERVICE_HEALTH_CHECK_FAILED",
            FindingCode::ConfigEmpty => "CONFIG_EMPTY",
            FindingCode::EvaluatorNotRun => "EVALUATOR_NOT_RUN",
            FindingCode::EvaluatorStuck => "EVALUATOR_STUCK",
            FindingCode::EvaluatorTimestampInvalid => "EVALUATOR_TIMESTAMP_INVALID",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic item produced by an audit pass. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    id: FindingCode,
    detail: String,
}

impl Finding {
    pub fn new(id: FindingCode, detail: impl Into<String>) -> Self {
        Self {
            id,
            detail: detail.into(),
        }
    }

    pub fn id(&self) -> FindingCode {
        self.id
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.detail)
    }
}
