//! Loop statistics - counters shared between the loop task and the HTTP handlers

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::CycleOutcome;

/// Counters updated by the background loop
#[derive(Debug, Default)]
pub struct LoopStats {
    iterations: AtomicU64,
    completed: AtomicU64,
    blocked: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

/// Point-in-time copy of [`LoopStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStatsSnapshot {
    pub iterations: u64,
    pub completed: u64,
    pub blocked: u64,
    pub failed: u64,
    pub timed_out: u64,
}

impl LoopStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished iteration under its outcome
    pub fn record(&self, outcome: &CycleOutcome) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            CycleOutcome::Completed { .. } => &self.completed,
            CycleOutcome::BlockedBySafety { .. } => &self.blocked,
            CycleOutcome::Failed { .. } => &self.failed,
            CycleOutcome::TimedOut => &self.timed_out,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LoopStatsSnapshot {
        LoopStatsSnapshot {
            iterations: self.iterations.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
        }
    }
}
