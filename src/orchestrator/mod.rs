//! Orchestration loop - background task, loop state and statistics

mod controller;
mod stats;

pub use controller::{LoopController, LoopState};
pub use stats::{LoopStats, LoopStatsSnapshot};
