//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the application's
//! parameter types by [`FileConfig::to_orchestration_config`].

mod council;
mod jobs;
mod logging;
mod models;
mod reasoning;
mod runtime;
mod safety;
mod tools;

pub use council::{FileCouncilConfig, FilePersonaConfig};
pub use jobs::{FileJobConfig, validate_jobs};
pub use logging::FileLoggingConfig;
pub use models::{FileCircuitConfig, FileModelsConfig};
pub use reasoning::FileReasoningConfig;
pub use runtime::{FileConvergenceConfig, FileHeartbeatConfig, FilePoolConfig};
pub use safety::FileSafetyConfig;
pub use tools::FileToolsConfig;

use conclave_application::OrchestrationConfig;
use conclave_domain::{ConfigIssue, Tier};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Tier model lists and backend command
    pub models: FileModelsConfig,
    pub reasoning: FileReasoningConfig,
    /// Deliberation settings and persona roster
    pub council: FileCouncilConfig,
    pub pool: FilePoolConfig,
    /// Heartbeat loop and autonomy cycle settings
    pub heartbeat: FileHeartbeatConfig,
    pub convergence: FileConvergenceConfig,
    /// Additions to the built-in deny list and protected paths
    pub safety: FileSafetyConfig,
    pub tools: FileToolsConfig,
    pub jobs: Vec<FileJobConfig>,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Build the application configuration from the raw file sections.
    ///
    /// Council participants default to the balanced tier's models.
    pub fn to_orchestration_config(&self) -> OrchestrationConfig {
        let (balanced, _) = self.models.parse_tier(Tier::Balanced);
        OrchestrationConfig::default()
            .with_reasoning(self.reasoning.to_params())
            .with_council(self.council.to_params(&balanced))
            .with_pool(self.pool.to_params())
            .with_heartbeat(self.heartbeat.to_heartbeat_params())
            .with_autonomy(self.heartbeat.to_autonomy_params())
            .with_convergence(self.convergence.to_tracker())
            .with_safety(self.safety.to_params())
    }

    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Model lists and backend command
    /// 2. Raw persona weights (before clamping)
    /// 3. Job declarations
    /// 4. Limits, ratios, intervals and safety patterns of the built config
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.models.validate());
        issues.extend(self.council.validate());
        issues.extend(validate_jobs(&self.jobs));
        issues.extend(self.to_orchestration_config().validate());
        issues
    }

    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(ConfigIssue::is_error)
    }
}
