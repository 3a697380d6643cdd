//! Dissonance - orchestration loop and system auditor
//!
//! Drives the perpetual proposer → critic → safety gate → learner cycle
//! under a deadline, and audits the collaborator services (health, config,
//! and the loop's own liveness) on demand.

pub mod audit;
pub mod client;
pub mod config;
pub mod cycle;
pub mod domain;
pub mod error;
pub mod id;
pub mod liveness;
pub mod orchestrator;
pub mod server;

pub use error::{DissonanceError, Result};
