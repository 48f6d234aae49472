//! Scheduled job declarations from TOML (`[[jobs]]`)

use conclave_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One recurring job run by the heartbeat's job queue
///
/// ```toml
/// [[jobs]]
/// id = "lint"
/// command = "cargo clippy --quiet"
/// every_secs = 600
/// priority = 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileJobConfig {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub priority: i32,
    /// Re-run period; zero runs the job on every tick
    #[serde(default = "default_every_secs")]
    pub every_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_every_secs() -> u64 {
    300
}

fn default_enabled() -> bool {
    true
}

/// Duplicate ids and empty commands.
pub fn validate_jobs(jobs: &[FileJobConfig]) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();
    for job in jobs {
        if !seen.insert(job.id.as_str()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::DuplicateJob,
                format!("jobs: '{}' is declared more than once", job.id),
            ));
        }
        if job.command.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingCommand,
                format!("jobs.{}: command is empty", job.id),
            ));
        }
    }
    issues
}
