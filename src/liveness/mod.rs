//! Liveness monitoring for the orchestration loop

mod probe;

pub use probe::{LAST_RUN_FIELD, LivenessProbe, assess_liveness};
