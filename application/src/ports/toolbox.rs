//! Toolbox port
//!
//! Executes validated [`Action`]s for the reasoning executor. The safety
//! policy has already been applied by the time an action reaches here.

use async_trait::async_trait;
use conclave_domain::{Action, Observation};

/// Executes tool actions
///
/// Failures are reported as error observations rather than `Err`, so the
/// model sees them on its next step.
#[async_trait]
pub trait Toolbox: Send + Sync {
    /// Tool names this toolbox can dispatch (see `conclave_domain::reasoning::action::TOOL_NAMES`).
    fn capabilities(&self) -> Vec<&'static str>;

    /// Execute an action and describe what happened.
    async fn dispatch(&self, action: &Action) -> Observation;
}

/// Toolbox that rejects everything; reasoning still works through
/// `finish[...]` and final answers.
pub struct NoTools;

#[async_trait]
impl Toolbox for NoTools {
    fn capabilities(&self) -> Vec<&'static str> {
        Vec::new()
    }

    async fn dispatch(&self, action: &Action) -> Observation {
        Observation::error(format!("tool '{}' is not available", action.tool_name()))
    }
}
