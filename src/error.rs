//! Error types for dissonance
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::client::ClientError;

/// All error types that can occur while orchestrating or auditing
#[derive(Debug, Error)]
pub enum DissonanceError {
    /// Invalid or unloadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// A collaborator call failed (transport, protocol or deadline)
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] ClientError),

    /// A collaborator answered, but the payload is missing something we need
    #[error("Payload error: {0}")]
    Payload(String),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dissonance operations
pub type Result<T> = std::result::Result<T, DissonanceError>;
