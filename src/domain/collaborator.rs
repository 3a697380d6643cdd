//! Collaborator descriptors.
//!
//! The set of collaborators is built once from config at startup and is
//! read-only afterwards.

use serde::Serialize;

pub const PROPOSER: &str = "proposer";
pub const CRITIC: &str = "critic";
pub const SAFETY_GATE: &str = "safety-gate";
pub const LEARNER: &str = "learner";
pub const META_CONTROLLER: &str = "meta-controller";
pub const EVALUATOR: &str = "evaluator";

/// A collaborator the auditor probes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollaboratorDescriptor {
    name: String,
    health_url: String,
    config_url: String,
}

impl CollaboratorDescriptor {
    pub fn new(name: impl Into<String>, health_url: impl Into<String>, config_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health_url: health_url.into(),
            config_url: config_url.into(),
        }
    }

    /// Build from a base URL using the standard `/health` and `/config` paths
    pub fn from_base_url(name: impl Into<String>, base_url: &str) -> Self {
        Self::new(name, join_url(base_url, "health"), join_url(base_url, "config"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    pub fn config_url(&self) -> &str {
        &self.config_url
    }
}

/// Join a base URL and a path segment with exactly one slash
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
