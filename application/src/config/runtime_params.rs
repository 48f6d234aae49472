//! Runtime parameters for the agent pool and the heartbeat.

use conclave_domain::{BackoffPolicy, Tier};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Agent pool control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolParams {
    /// Agents run concurrently per batch.
    pub max_concurrent: usize,
    /// Per-agent wall-clock limit.
    pub agent_timeout: Duration,
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            agent_timeout: Duration::from_secs(300),
        }
    }
}

impl PoolParams {
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }
}

/// Heartbeat scheduler parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatParams {
    /// Base interval between cycles; clamped to `[5s, 3600s]` by the scheduler.
    pub interval: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for HeartbeatParams {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl HeartbeatParams {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Autonomy cycle parameters.
///
/// | Field | Phase |
/// |-------|-------|
/// | `model_questions` | question |
/// | `max_iterations`, `min_delta` | score / stop |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutonomyParams {
    pub max_iterations: usize,
    /// Score improvement (0-100 scale) below which the cycle stops.
    pub min_delta: f64,
    /// Ask a model for adversarial questions instead of the heuristics.
    pub model_questions: bool,
    pub question_tier: Tier,
    /// Snapshots kept for convergence decisions.
    pub history_len: usize,
}

impl Default for AutonomyParams {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            min_delta: 1.0,
            model_questions: false,
            question_tier: Tier::Fast,
            history_len: 10,
        }
    }
}

impl AutonomyParams {
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_min_delta(mut self, delta: f64) -> Self {
        self.min_delta = delta;
        self
    }

    pub fn with_model_questions(mut self, enabled: bool) -> Self {
        self.model_questions = enabled;
        self
    }
}
