//! CLI module for dissonance - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for the two services and
//! their one-shot counterparts.

pub mod commands;

pub use commands::Cli;
