//! Configuration system for dissonance.
//!
//! Two layers:
//! 1. YAML file (explicit path, ./dissonance.yml, ~/.config/dissonance/dissonance.yml)
//! 2. Environment overrides (the collaborator services' own variable names)

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::CollaboratorDescriptor;
use crate::domain::collaborator::{CRITIC, EVALUATOR, LEARNER, META_CONTROLLER, PROPOSER, SAFETY_GATE};

mod env;

pub use env::ENV_KEYS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Append logs here instead of stderr
    #[serde(rename = "log-file")]
    pub log_file: Option<PathBuf>,

    pub collaborators: CollaboratorsConfig,

    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,

    pub audit: AuditConfig,

    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            log_file: None,
            collaborators: CollaboratorsConfig::default(),
            loop_config: LoopConfig::default(),
            audit: AuditConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Base URLs of every collaborator service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorsConfig {
    #[serde(rename = "proposer-url")]
    pub proposer_url: String,

    #[serde(rename = "critic-url")]
    pub critic_url: String,

    #[serde(rename = "safety-gate-url")]
    pub safety_gate_url: String,

    #[serde(rename = "learner-url")]
    pub learner_url: String,

    #[serde(rename = "meta-controller-url")]
    pub meta_controller_url: String,

    /// The orchestration loop's own service, probed for liveness
    #[serde(rename = "evaluator-url")]
    pub evaluator_url: String,
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            proposer_url: "http://proposer:8000".to_string(),
            critic_url: "http://critic:8000".to_string(),
            safety_gate_url: "http://safety-gate:8000".to_string(),
            learner_url: "http://learner:8000".to_string(),
            meta_controller_url: "http://meta-controller:8000".to_string(),
            evaluator_url: "http://evaluator:8000".to_string(),
        }
    }
}

impl CollaboratorsConfig {
    /// Every collaborator the auditor probes, in report order
    pub fn descriptors(&self) -> Vec<CollaboratorDescriptor> {
        [
            (PROPOSER, &self.proposer_url),
            (CRITIC, &self.critic_url),
            (SAFETY_GATE, &self.safety_gate_url),
            (LEARNER, &self.learner_url),
            (META_CONTROLLER, &self.meta_controller_url),
            (EVALUATOR, &self.evaluator_url),
        ]
        .into_iter()
        .map(|(name, url)| CollaboratorDescriptor::from_base_url(name, url))
        .collect()
    }

    /// The four collaborators a cycle calls, in call order
    pub fn pipeline_descriptors(&self) -> Vec<CollaboratorDescriptor> {
        self.descriptors()
            .into_iter()
            .filter(|d| [PROPOSER, CRITIC, SAFETY_GATE, LEARNER].contains(&d.name()))
            .collect()
    }
}

/// Background loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Deadline for one cycle
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: f64,

    /// Timeout for each collaborator call inside a cycle
    #[serde(rename = "call-timeout-seconds")]
    pub call_timeout_seconds: f64,

    /// Sleep between cycles, regardless of outcome
    #[serde(rename = "interval-seconds")]
    pub interval_seconds: f64,

    /// Poll collaborator health before the first cycle
    #[serde(rename = "wait-for-collaborators")]
    pub wait_for_collaborators: bool,

    #[serde(rename = "readiness-retry-seconds")]
    pub readiness_retry_seconds: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30.0,
            call_timeout_seconds: 10.0,
            interval_seconds: 2.0,
            wait_for_collaborators: false,
            readiness_retry_seconds: 3.0,
        }
    }
}

impl LoopConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.call_timeout_seconds)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_seconds)
    }

    pub fn readiness_retry(&self) -> Duration {
        Duration::from_secs_f64(self.readiness_retry_seconds)
    }
}

/// A model file whose presence the auditor checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub path: PathBuf,
}

/// Auditor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Timeout applied to each probe individually
    #[serde(rename = "probe-timeout-seconds")]
    pub probe_timeout_seconds: f64,

    /// Stuck threshold = multiplier × the monitored loop's timeout
    #[serde(rename = "stuck-threshold-multiplier")]
    pub stuck_threshold_multiplier: f64,

    /// Collaborator allowed to report an empty config
    #[serde(rename = "config-less-collaborator")]
    pub config_less_collaborator: Option<String>,

    #[serde(rename = "model-artifacts")]
    pub model_artifacts: Vec<ModelArtifact>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            probe_timeout_seconds: 5.0,
            stuck_threshold_multiplier: 1.5,
            config_less_collaborator: Some(LEARNER.to_string()),
            model_artifacts: vec![
                ModelArtifact {
                    name: PROPOSER.to_string(),
                    path: PathBuf::from("/app/models/proposer.pkl"),
                },
                ModelArtifact {
                    name: CRITIC.to_string(),
                    path: PathBuf::from("/app/models/critic.pkl"),
                },
            ],
        }
    }
}

impl AuditConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.probe_timeout_seconds)
    }
}

/// Listen addresses for the two services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    #[serde(rename = "evaluator-bind")]
    pub evaluator_bind: String,

    #[serde(rename = "auditor-bind")]
    pub auditor_bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            evaluator_bind: "0.0.0.0:8003".to_string(),
            auditor_bind: "0.0.0.0:8007".to_string(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. ./dissonance.yml
    /// 3. ~/.config/dissonance/dissonance.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Reject values the loop or auditor cannot run with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("loop.timeout-seconds", self.loop_config.timeout_seconds),
            ("loop.call-timeout-seconds", self.loop_config.call_timeout_seconds),
            ("loop.interval-seconds", self.loop_config.interval_seconds),
            ("loop.readiness-retry-seconds", self.loop_config.readiness_retry_seconds),
            ("audit.probe-timeout-seconds", self.audit.probe_timeout_seconds),
        ];
        for (key, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                eyre::bail!("{} must be > 0 (got {})", key, value);
            }
            if Duration::try_from_secs_f64(value).is_err() {
                eyre::bail!("{} is out of range (got {})", key, value);
            }
        }
        // The threshold has to sit above one cycle's own deadline
        if !self.audit.stuck_threshold_multiplier.is_finite() || self.audit.stuck_threshold_multiplier <= 1.0 {
            eyre::bail!(
                "audit.stuck-threshold-multiplier must be > 1.0 (got {})",
                self.audit.stuck_threshold_multiplier
            );
        }
        let threshold = self.loop_config.timeout_seconds * self.audit.stuck_threshold_multiplier;
        if Duration::try_from_secs_f64(threshold).is_err() {
            eyre::bail!(
                "loop.timeout-seconds x audit.stuck-threshold-multiplier is out of range (got {})",
                threshold
            );
        }
        Ok(())
    }

    /// Age beyond which the evaluator loop is reported stuck
    pub fn stuck_threshold(&self) -> Duration {
        self.loop_config.timeout().mul_f64(self.audit.stuck_threshold_multiplier)
    }
}
