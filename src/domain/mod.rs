//! Domain types for the orchestration pipeline
//!
//! Outcomes produced by cycles, findings produced by audits, and the static
//! description of the collaborator set.

pub mod collaborator;
pub mod finding;
pub mod outcome;

pub use collaborator::{CollaboratorDescriptor, join_url};
pub use finding::{Finding, FindingCode};
pub use outcome::CycleOutcome;
