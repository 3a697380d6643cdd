//! Cycle execution outcome types.
//!
//! This module defines the result of one orchestration cycle.

use serde::{Deserialize, Serialize};

/// Outcome of one proposer → critic → safety gate → learner pass.
///
/// Serialized with a `status` tag, which is the `/run_once` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Every stage ran and the learner acknowledged the update
    Completed { correlation_id: String },
    /// Safety gate refused; the learner was not called
    BlockedBySafety { reason: String },
    /// The cycle exceeded its deadline
    TimedOut,
    /// A collaborator call or payload failed; the cycle was abandoned
    Failed { cause: String },
}

impl CycleOutcome {
    /// Whether this outcome proves the loop is alive.
    ///
    /// A safety block is a normal end of cycle, not a failure.
    pub fn is_alive(&self) -> bool {
        matches!(self, CycleOutcome::Completed { .. } | CycleOutcome::BlockedBySafety { .. })
    }

    /// Short label used in logs and counters
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Completed { .. } => "completed",
            CycleOutcome::BlockedBySafety { .. } => "blocked_by_safety",
            CycleOutcome::TimedOut => "timed_out",
            CycleOutcome::Failed { .. } => "failed",
        }
    }
}
