//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - evaluator: serve the orchestration loop endpoints
//! - auditor: serve the audit endpoints
//! - run-once: run one cycle and print the outcome
//! - audit: run one audit and print the findings

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dissonance - orchestration loop and system auditor for the propose/critique/gate/learn pipeline
#[derive(Parser, Debug)]
#[command(name = "dissonance")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the evaluator endpoints (/run_once, /start_loop, /health, /config, /metrics)
    Evaluator {
        /// Start the background loop at boot instead of waiting for /start_loop
        #[arg(long)]
        start_loop: bool,

        /// Listen address, overriding the config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Serve the auditor endpoints (/audit, /health, /config)
    Auditor {
        /// Listen address, overriding the config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run a single cycle and print its outcome
    RunOnce,

    /// Run a single audit and print its findings
    Audit {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}
