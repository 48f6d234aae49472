//! Artifact reviewer port
//!
//! Lets the toolbox hand an artifact to the deliberation council without
//! depending on the engine's model type.

use crate::use_cases::deliberate::DeliberationError;
use async_trait::async_trait;
use conclave_domain::DeliberationOutcome;

/// Reviews an artifact by council vote
#[async_trait]
pub trait ArtifactReviewer: Send + Sync {
    async fn review_artifact(&self, artifact: &str)
    -> Result<DeliberationOutcome, DeliberationError>;
}
