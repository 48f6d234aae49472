//! Type definitions for the reasoning use case.

use crate::ports::model_service::ModelError;
use conclave_domain::{Step, Strategy};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a strategy attempt and trigger the fallback cascade
#[derive(Error, Debug, Clone)]
pub enum ReasoningError {
    #[error("Step limit of {0} reached")]
    StepLimit(usize),

    #[error("Timed out after {elapsed:?}; last observation: {last}")]
    Timeout { elapsed: Duration, last: String },

    #[error("Model returned an empty plan")]
    EmptyPlan,

    #[error("No answer after {0} self-critique attempts")]
    AttemptsExhausted(usize),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Which stage of the cascade produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStage {
    /// The requested (or auto-selected) strategy.
    Primary,
    /// The iterative retry after the primary strategy failed.
    Iterative,
    /// The last-resort direct query.
    DirectQuery,
}

/// A strategy's answer before it is wrapped into an outcome.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Attempt {
    pub answer: String,
    /// False for soft stops (budget) and unconfirmed self-critique answers.
    pub complete: bool,
}

impl Attempt {
    pub(crate) fn answered(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            complete: true,
        }
    }

    pub(crate) fn partial(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            complete: false,
        }
    }
}

/// Result of a [`ReasoningExecutor`](super::ReasoningExecutor) call
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningOutcome {
    pub answer: String,
    pub success: bool,
    /// Strategy that was tried first.
    pub strategy: Strategy,
    pub stage: FallbackStage,
    /// Step log of the attempt that produced the answer.
    pub steps: Vec<Step>,
    /// Steps taken across every attempt of the call.
    pub total_steps: usize,
    pub cost: f64,
    /// Why the primary strategy did not answer, when it did not.
    pub error: Option<String>,
}

impl ReasoningOutcome {
    pub fn is_degraded(&self) -> bool {
        self.stage != FallbackStage::Primary
    }
}
