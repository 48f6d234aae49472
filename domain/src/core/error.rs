//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid safety pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid state transition: {0}")]
    InvalidState(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
