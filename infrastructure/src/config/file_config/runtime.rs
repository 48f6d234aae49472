//! Runtime loop configuration from TOML (`[pool]`, `[heartbeat]`, `[convergence]`)

use conclave_application::{AutonomyParams, HeartbeatParams, PoolParams};
use conclave_domain::{BackoffPolicy, ConvergenceTracker, Tier};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Agent pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePoolConfig {
    pub max_concurrent: usize,
    pub agent_timeout_secs: u64,
    /// Share of the parent budget each spawned agent receives
    pub budget_fraction: f64,
}

impl Default for FilePoolConfig {
    fn default() -> Self {
        let params = PoolParams::default();
        Self {
            max_concurrent: params.max_concurrent,
            agent_timeout_secs: params.agent_timeout.as_secs(),
            budget_fraction: 0.25,
        }
    }
}

impl FilePoolConfig {
    pub fn to_params(&self) -> PoolParams {
        PoolParams::default()
            .with_max_concurrent(self.max_concurrent)
            .with_agent_timeout(Duration::from_secs(self.agent_timeout_secs))
    }
}

/// Heartbeat and autonomy cycle configuration
///
/// # Example
///
/// ```toml
/// [heartbeat]
/// interval_secs = 120
/// backoff_base_secs = 30
/// max_iterations = 5
/// model_questions = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHeartbeatConfig {
    pub interval_secs: u64,
    pub backoff_base_secs: u64,
    pub backoff_max_secs: u64,
    /// Consecutive failures tolerated before backoff applies
    pub failure_threshold: u32,
    pub max_iterations: usize,
    pub min_delta: f64,
    pub model_questions: bool,
    pub question_tier: Tier,
    pub history_len: usize,
}

impl Default for FileHeartbeatConfig {
    fn default() -> Self {
        let heartbeat = HeartbeatParams::default();
        let autonomy = AutonomyParams::default();
        Self {
            interval_secs: heartbeat.interval.as_secs(),
            backoff_base_secs: heartbeat.backoff.base_secs,
            backoff_max_secs: heartbeat.backoff.max_secs,
            failure_threshold: heartbeat.backoff.failure_threshold,
            max_iterations: autonomy.max_iterations,
            min_delta: autonomy.min_delta,
            model_questions: autonomy.model_questions,
            question_tier: autonomy.question_tier,
            history_len: autonomy.history_len,
        }
    }
}

impl FileHeartbeatConfig {
    pub fn to_heartbeat_params(&self) -> HeartbeatParams {
        HeartbeatParams::default()
            .with_interval(Duration::from_secs(self.interval_secs))
            .with_backoff(BackoffPolicy {
                base_secs: self.backoff_base_secs,
                max_secs: self.backoff_max_secs,
                failure_threshold: self.failure_threshold,
            })
    }

    pub fn to_autonomy_params(&self) -> AutonomyParams {
        let mut params = AutonomyParams::default()
            .with_max_iterations(self.max_iterations)
            .with_min_delta(self.min_delta)
            .with_model_questions(self.model_questions);
        params.question_tier = self.question_tier;
        params.history_len = self.history_len;
        params
    }
}

/// Convergence tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConvergenceConfig {
    pub window: usize,
    pub epsilon: f64,
    pub max_iterations: usize,
    pub similarity_threshold: f64,
}

impl Default for FileConvergenceConfig {
    fn default() -> Self {
        let tracker = ConvergenceTracker::default();
        Self {
            window: tracker.window,
            epsilon: tracker.epsilon,
            max_iterations: tracker.max_iterations,
            similarity_threshold: tracker.similarity_threshold,
        }
    }
}

impl FileConvergenceConfig {
    pub fn to_tracker(&self) -> ConvergenceTracker {
        ConvergenceTracker::new(self.window, self.epsilon, self.max_iterations)
            .with_similarity_threshold(self.similarity_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_into_params() {
        let heartbeat = FileHeartbeatConfig::default();
        assert_eq!(heartbeat.to_heartbeat_params().interval, Duration::from_secs(60));
        assert_eq!(heartbeat.to_heartbeat_params().backoff, BackoffPolicy::default());
        assert_eq!(FileConvergenceConfig::default().to_tracker(), ConvergenceTracker::default());
        assert_eq!(FilePoolConfig::default().to_params().max_concurrent, 4);
    }

    #[test]
    fn test_partial_heartbeat_section() {
        let config: FileHeartbeatConfig = toml::from_str(
            r#"
interval_secs = 1
model_questions = true
question_tier = "deep"
"#,
        )
        .unwrap();
        // Clamping happens in the scheduler, not here
        assert_eq!(config.to_heartbeat_params().interval, Duration::from_secs(1));
        let autonomy = config.to_autonomy_params();
        assert!(autonomy.model_questions);
        assert_eq!(autonomy.question_tier, Tier::Deep);
        assert_eq!(autonomy.max_iterations, 3);
    }
}
