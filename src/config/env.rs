//! Environment overrides (Layer 2).
//!
//! Variable names match the ones the collaborator services read, so one
//! environment file can configure the whole deployment.

use eyre::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use super::{Config, ModelArtifact};
use crate::domain::collaborator::{CRITIC, PROPOSER};

/// Every environment variable the config layer recognizes
pub const ENV_KEYS: &[&str] = &[
    "LOG_LEVEL",
    "PROPOSER_URL",
    "CRITIC_URL",
    "SAFETY_GATE_URL",
    "LEARNER_URL",
    "META_CONTROLLER_URL",
    "EVALUATOR_URL",
    "LOOP_TIMEOUT_SECONDS",
    "CALL_TIMEOUT_SECONDS",
    "LOOP_INTERVAL_SECONDS",
    "PROBE_TIMEOUT_SECONDS",
    "STUCK_THRESHOLD_MULTIPLIER",
    "PROPOSER_MODEL_PATH",
    "CRITIC_MODEL_PATH",
    "EVALUATOR_BIND",
    "AUDITOR_BIND",
];

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
}

impl Config {
    /// Apply overrides from an arbitrary lookup (the process env in production)
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for &key in ENV_KEYS {
            let Some(raw) = lookup(key) else {
                continue;
            };
            log::debug!("Config override from environment: {}", key);
            match key {
                "LOG_LEVEL" => self.log_level = Some(raw),
                "PROPOSER_URL" => self.collaborators.proposer_url = raw,
                "CRITIC_URL" => self.collaborators.critic_url = raw,
                "SAFETY_GATE_URL" => self.collaborators.safety_gate_url = raw,
                "LEARNER_URL" => self.collaborators.learner_url = raw,
                "META_CONTROLLER_URL" => self.collaborators.meta_controller_url = raw,
                "EVALUATOR_URL" => self.collaborators.evaluator_url = raw,
                "LOOP_TIMEOUT_SECONDS" => self.loop_config.timeout_seconds = parse(key, &raw)?,
                "CALL_TIMEOUT_SECONDS" => self.loop_config.call_timeout_seconds = parse(key, &raw)?,
                "LOOP_INTERVAL_SECONDS" => self.loop_config.interval_seconds = parse(key, &raw)?,
                "PROBE_TIMEOUT_SECONDS" => self.audit.probe_timeout_seconds = parse(key, &raw)?,
                "STUCK_THRESHOLD_MULTIPLIER" => self.audit.stuck_threshold_multiplier = parse(key, &raw)?,
                "PROPOSER_MODEL_PATH" => self.set_model_path(PROPOSER, PathBuf::from(raw)),
                "CRITIC_MODEL_PATH" => self.set_model_path(CRITIC, PathBuf::from(raw)),
                "EVALUATOR_BIND" => self.server.evaluator_bind = raw,
                "AUDITOR_BIND" => self.server.auditor_bind = raw,
                _ => {}
            }
        }
        Ok(())
    }

    fn set_model_path(&mut self, name: &str, path: PathBuf) {
        match self.audit.model_artifacts.iter_mut().find(|a| a.name == name) {
            Some(artifact) => artifact.path = path,
            None => self.audit.model_artifacts.push(ModelArtifact {
                name: name.to_string(),
                path,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_urls_and_timeouts() {
        let mut config = Config::default();
        config
            .apply_env_with(lookup(&[
                ("CRITIC_URL", "http://localhost:9002"),
                ("LOOP_TIMEOUT_SECONDS", "12.5"),
                ("STUCK_THRESHOLD_MULTIPLIER", "2"),
            ]))
            .unwrap();

        assert_eq!(config.collaborators.critic_url, "http://localhost:9002");
        assert_eq!(config.loop_config.timeout_seconds, 12.5);
        assert_eq!(config.audit.stuck_threshold_multiplier, 2.0);
        // Untouched
        assert_eq!(config.collaborators.proposer_url, "http://proposer:8000");
    }

    #[test]
    fn test_env_invalid_number_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_env_with(lookup(&[("LOOP_TIMEOUT_SECONDS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("LOOP_TIMEOUT_SECONDS"));
    }

    #[test]
    fn test_env_model_path_override() {
        let mut config = Config::default();
        config
            .apply_env_with(lookup(&[("CRITIC_MODEL_PATH", "/tmp/critic.pkl")]))
            .unwrap();
        let critic = config
            .audit
            .model_artifacts
            .iter()
            .find(|a| a.name == "critic")
            .unwrap();
        assert_eq!(critic.path, PathBuf::from("/tmp/critic.pkl"));
        assert_eq!(config.audit.model_artifacts.len(), 2);
    }

    #[test]
    fn test_env_empty_lookup_is_noop() {
        let mut config = Config::default();
        config.apply_env_with(|_| None).unwrap();
        assert_eq!(config.loop_config.timeout_seconds, 30.0);
    }
}
