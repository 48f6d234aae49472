//! Type definitions for the deliberation use case.

use thiserror::Error;

/// Errors that prevent a deliberation from starting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliberationError {
    #[error("Nothing to deliberate: the artifact is empty")]
    EmptyArtifact,
}
