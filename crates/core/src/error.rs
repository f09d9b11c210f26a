//! Error types for vpsterm-core

use crate::types::ConnectionPhase;
use thiserror::Error;

/// Core error type
///
/// Unknown commands and bad operands are never errors: the interpreter
/// reports them as shell output. These variants cover misuse of the
/// session lifecycle and invalid host input.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not connected (phase: {0})")]
    NotConnected(ConnectionPhase),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid server identity: {0}")]
    InvalidIdentity(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;
