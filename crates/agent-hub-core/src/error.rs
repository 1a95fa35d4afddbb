//! Error types for the core building blocks.

use thiserror::Error;

/// Log error.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("No log entry at position {0}")]
    NotFound(usize),
}

/// Failure raised by an agent loop while processing a submission.
///
/// Captured at the execution-slot boundary and resolved into a failed
/// result value; it never takes down the service or wedges the slot.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct AgentError(pub String);

impl AgentError {
    /// Create an agent error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Storage error.
///
/// Lookups never fail on absence (missing chats read as empty, removal
/// of a missing chat is a no-op), so the only failure is an internal
/// backend one.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Internal(String),
}
