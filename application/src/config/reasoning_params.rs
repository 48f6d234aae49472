//! Reasoning parameters: executor loop control.
//!
//! [`ReasoningParams`] groups the static parameters that bound a
//! [`ReasoningExecutor`](crate::use_cases::reasoning::ReasoningExecutor) run.

use conclave_domain::Tier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Reasoning loop control parameters.
///
/// | Field | Applies to |
/// |-------|------------|
/// | `max_steps` | every strategy and the iterative fallback |
/// | `max_duration` | each strategy attempt |
/// | `critique_*` | self-critique only |
/// | tiers | model routing per call kind |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningParams {
    /// Maximum tool steps per strategy attempt.
    pub max_steps: usize,
    /// Wall-clock ceiling for one strategy attempt.
    pub max_duration: Duration,
    /// Step limit of each inner iterative attempt in self-critique.
    pub critique_inner_steps: usize,
    /// Number of self-critique attempts before returning the best one.
    pub critique_attempts: usize,
    /// Working directory that file writes must stay inside.
    pub working_dir: PathBuf,
    /// Tier for thought/action steps and plans.
    pub step_tier: Tier,
    /// Tier for reflections and synthesis.
    pub review_tier: Tier,
    /// Tier for the last-resort direct query.
    pub direct_tier: Tier,
}

impl Default for ReasoningParams {
    fn default() -> Self {
        Self {
            max_steps: 10,
            max_duration: Duration::from_secs(600),
            critique_inner_steps: 4,
            critique_attempts: 3,
            working_dir: PathBuf::from("."),
            step_tier: Tier::Balanced,
            review_tier: Tier::Fast,
            direct_tier: Tier::Deep,
        }
    }
}

impl ReasoningParams {
    // ==================== Builder Methods ====================

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = duration;
        self
    }

    pub fn with_critique_attempts(mut self, attempts: usize, inner_steps: usize) -> Self {
        self.critique_attempts = attempts;
        self.critique_inner_steps = inner_steps;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_tiers(mut self, step: Tier, review: Tier, direct: Tier) -> Self {
        self.step_tier = step;
        self.review_tier = review;
        self.direct_tier = direct;
        self
    }
}
