//! Collaborator Client Layer - single-shot JSON calls with explicit timeouts
//!
//! This module provides:
//! - CollaboratorClient trait for call abstraction
//! - ClientError taxonomy (transport vs. protocol vs. deadline)
//! - HttpCollaboratorClient implementation over reqwest
//! - MockCollaboratorClient for tests

pub mod client;
pub mod http;
pub mod mock;

pub use client::{ClientError, CollaboratorClient};
pub use http::HttpCollaboratorClient;
pub use mock::{MockCollaboratorClient, MockReply};
