//! Local toolbox configuration from TOML (`[tools]` section)

use serde::{Deserialize, Serialize};

/// ```toml
/// [tools]
/// notes_dir = "~/notes"
/// shell_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Directory searched by the `search` tool; search is disabled when unset
    pub notes_dir: Option<String>,
    pub shell_timeout_secs: u64,
    /// Output beyond this many bytes is truncated
    pub max_output_bytes: usize,
    /// Offer `review` to reasoning agents (runs the council)
    pub enable_review: bool,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            notes_dir: None,
            shell_timeout_secs: 60,
            max_output_bytes: 64 * 1024,
            enable_review: true,
        }
    }
}
