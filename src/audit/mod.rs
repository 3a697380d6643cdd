//! System audit - model files, collaborator health and config, loop liveness

mod auditor;
pub mod checks;

pub use auditor::{AuditSettings, SystemAuditor};
pub use checks::ProbeResult;
