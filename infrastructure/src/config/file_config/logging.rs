//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

/// ```toml
/// [logging]
/// event_log = ".conclave/events.jsonl"
/// log_dir = ".conclave/logs"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving orchestration events
    pub event_log: Option<String>,
    /// Directory for daily-rolling tracing logs (overridden by `--log-dir`)
    pub log_dir: Option<String>,
}
