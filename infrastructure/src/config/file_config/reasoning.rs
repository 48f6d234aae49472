//! Reasoning executor configuration from TOML (`[reasoning]` section)

use conclave_application::ReasoningParams;
use conclave_domain::Tier;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reasoning configuration from TOML
///
/// # Example
///
/// ```toml
/// [reasoning]
/// max_steps = 12
/// max_duration_secs = 300
/// critique_attempts = 3
/// critique_inner_steps = 4
/// step_tier = "balanced"
/// direct_tier = "deep"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReasoningConfig {
    pub max_steps: usize,
    /// Wall-clock limit of one strategy attempt
    pub max_duration_secs: u64,
    pub critique_inner_steps: usize,
    pub critique_attempts: usize,
    /// Root that file writes must stay under (default: current directory)
    pub working_dir: Option<String>,
    pub step_tier: Tier,
    pub review_tier: Tier,
    pub direct_tier: Tier,
}

impl Default for FileReasoningConfig {
    fn default() -> Self {
        let params = ReasoningParams::default();
        Self {
            max_steps: params.max_steps,
            max_duration_secs: params.max_duration.as_secs(),
            critique_inner_steps: params.critique_inner_steps,
            critique_attempts: params.critique_attempts,
            working_dir: None,
            step_tier: params.step_tier,
            review_tier: params.review_tier,
            direct_tier: params.direct_tier,
        }
    }
}

impl FileReasoningConfig {
    pub fn to_params(&self) -> ReasoningParams {
        let params = ReasoningParams::default()
            .with_max_steps(self.max_steps)
            .with_max_duration(Duration::from_secs(self.max_duration_secs))
            .with_critique_attempts(self.critique_attempts, self.critique_inner_steps)
            .with_tiers(self.step_tier, self.review_tier, self.direct_tier);
        match &self.working_dir {
            Some(dir) => params.with_working_dir(dir),
            None => params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_params() {
        let params = FileReasoningConfig::default().to_params();
        let expected = ReasoningParams::default();
        assert_eq!(params.max_steps, expected.max_steps);
        assert_eq!(params.max_duration, expected.max_duration);
        assert_eq!(params.direct_tier, expected.direct_tier);
    }

    #[test]
    fn test_deserialize_tiers() {
        let config: FileReasoningConfig = toml::from_str(
            r#"
max_steps = 5
step_tier = "fast"
working_dir = "/srv/project"
"#,
        )
        .unwrap();
        let params = config.to_params();
        assert_eq!(params.max_steps, 5);
        assert_eq!(params.step_tier, Tier::Fast);
        assert_eq!(params.working_dir, std::path::PathBuf::from("/srv/project"));
    }
}
