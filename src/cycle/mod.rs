//! Cycle execution - the four-stage pipeline pass run by the loop and `/run_once`

mod executor;

pub use executor::{CycleEndpoints, CycleExecutor};
