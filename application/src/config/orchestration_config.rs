//! Orchestration configuration container.
//!
//! [`OrchestrationConfig`] groups the per-use-case parameter types. Use cases
//! receive only the slice they need; the CLI holds the full container.
//!
//! # Use Case Necessity Map
//!
//! | Type | Reasoning | Council | Pool | Heartbeat |
//! |------|-----------|---------|------|-----------|
//! | `ReasoningParams` | Yes | No | via runner | No |
//! | `CouncilParams` | No | Yes | No | No |
//! | `PoolParams` | No | No | Yes | No |
//! | `HeartbeatParams` / `AutonomyParams` | No | No | No | Yes |
//! | `SafetyParams` | Yes | No | via runner | Yes |

use crate::config::{AutonomyParams, CouncilParams, HeartbeatParams, PoolParams, ReasoningParams};
use conclave_domain::heartbeat::{MAX_INTERVAL, MIN_INTERVAL};
use conclave_domain::{ConfigIssue, ConfigIssueCode, ConvergenceTracker, DomainError, SafetyPolicy};
use serde::{Deserialize, Serialize};

/// Extra safety rules layered on top of the built-in deny list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyParams {
    pub deny_patterns: Vec<String>,
    pub protected_paths: Vec<String>,
}

impl SafetyParams {
    /// Build the policy for a working directory.
    pub fn policy(&self, working_dir: &std::path::Path) -> Result<SafetyPolicy, DomainError> {
        Ok(SafetyPolicy::new(working_dir)
            .with_deny_patterns(&self.deny_patterns)?
            .with_protected_paths(&self.protected_paths))
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrchestrationConfig {
    pub reasoning: ReasoningParams,
    pub council: CouncilParams,
    pub pool: PoolParams,
    pub heartbeat: HeartbeatParams,
    pub autonomy: AutonomyParams,
    pub convergence: ConvergenceTracker,
    pub safety: SafetyParams,
}

impl OrchestrationConfig {
    // ==================== Builder Methods ====================

    pub fn with_reasoning(mut self, reasoning: ReasoningParams) -> Self {
        self.reasoning = reasoning;
        self
    }

    pub fn with_council(mut self, council: CouncilParams) -> Self {
        self.council = council;
        self
    }

    pub fn with_pool(mut self, pool: PoolParams) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: HeartbeatParams) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn with_autonomy(mut self, autonomy: AutonomyParams) -> Self {
        self.autonomy = autonomy;
        self
    }

    pub fn with_convergence(mut self, convergence: ConvergenceTracker) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_safety(mut self, safety: SafetyParams) -> Self {
        self.safety = safety;
        self
    }

    /// Safety policy rooted at the reasoning working directory.
    pub fn safety_policy(&self) -> Result<SafetyPolicy, DomainError> {
        self.safety.policy(&self.reasoning.working_dir)
    }

    // ==================== Validation ====================

    /// Collect every configuration problem instead of stopping at the first.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (name, value) in [
            ("reasoning.max_steps", self.reasoning.max_steps),
            ("reasoning.critique_attempts", self.reasoning.critique_attempts),
            ("council.max_rounds", self.council.max_rounds),
            ("pool.max_concurrent", self.pool.max_concurrent),
            ("convergence.max_iterations", self.convergence.max_iterations),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroLimit,
                    format!("{} must be at least 1", name),
                ));
            }
        }

        for (name, value) in [
            ("council.threshold", self.council.threshold),
            ("council.convergence_delta", self.council.convergence_delta),
            ("convergence.similarity_threshold", self.convergence.similarity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::RatioOutOfRange,
                    format!("{} = {} is outside [0, 1]", name, value),
                ));
            }
        }

        for persona in &self.council.roster {
            if !(0.0..=1.0).contains(&persona.weight) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::PersonaWeightOutOfRange,
                    format!(
                        "persona '{}' weight {} will be clamped to [0, 1]",
                        persona.name, persona.weight
                    ),
                ));
            }
        }

        for model in self.council.participants.iter().chain(&self.council.arbiter) {
            if model.as_str().trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName,
                    "council model list contains an empty name",
                ));
            }
        }

        let interval = self.heartbeat.interval;
        if interval < MIN_INTERVAL || interval > MAX_INTERVAL {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::IntervalOutOfRange,
                format!(
                    "heartbeat interval {:?} will be clamped to [{:?}, {:?}]",
                    interval, MIN_INTERVAL, MAX_INTERVAL
                ),
            ));
        }

        if let Err(e) = self.safety_policy() {
            issues.push(ConfigIssue::error(ConfigIssueCode::InvalidPattern, e.to_string()));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::{ModelId, Persona};
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(OrchestrationConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let config = OrchestrationConfig::default()
            .with_council(
                CouncilParams::default()
                    .with_threshold(1.5)
                    .with_max_rounds(0)
                    .with_participants(vec![ModelId::new(" ")])
                    .with_roster(vec![Persona {
                        name: "loud".into(),
                        weight: 2.0,
                        veto: false,
                        directive: String::new(),
                    }]),
            )
            .with_heartbeat(HeartbeatParams::default().with_interval(Duration::from_secs(1)))
            .with_safety(SafetyParams {
                deny_patterns: vec!["(".into()],
                protected_paths: Vec::new(),
            });

        let codes: Vec<_> = config.validate().into_iter().map(|i| i.code).collect();
        assert!(codes.contains(&ConfigIssueCode::RatioOutOfRange));
        assert!(codes.contains(&ConfigIssueCode::ZeroLimit));
        assert!(codes.contains(&ConfigIssueCode::EmptyModelName));
        assert!(codes.contains(&ConfigIssueCode::PersonaWeightOutOfRange));
        assert!(codes.contains(&ConfigIssueCode::IntervalOutOfRange));
        assert!(codes.contains(&ConfigIssueCode::InvalidPattern));
    }

    #[test]
    fn test_interval_warning_is_not_fatal() {
        let config = OrchestrationConfig::default()
            .with_heartbeat(HeartbeatParams::default().with_interval(Duration::from_secs(7200)));
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }
}
