//! Safety configuration from TOML (`[safety]` section)
//!
//! Patterns and paths listed here are added to the built-in deny list and
//! protected path set; they never replace them.

use conclave_application::SafetyParams;
use serde::{Deserialize, Serialize};

/// ```toml
/// [safety]
/// deny_patterns = ['\bgit\s+push\s+--force\b']
/// protected_paths = ["secrets", "/etc"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSafetyConfig {
    pub deny_patterns: Vec<String>,
    pub protected_paths: Vec<String>,
}

impl FileSafetyConfig {
    pub fn to_params(&self) -> SafetyParams {
        SafetyParams {
            deny_patterns: self.deny_patterns.clone(),
            protected_paths: self.protected_paths.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_patterns_extend_policy() {
        let config: FileSafetyConfig =
            toml::from_str(r#"deny_patterns = ['\bshutdown\b']"#).unwrap();
        let policy = config
            .to_params()
            .policy(std::path::Path::new("/work"))
            .unwrap();
        assert!(!policy.check_command("sudo shutdown -h now").is_allowed());
        assert!(!policy.check_command("mkfs.ext4 /dev/sda1").is_allowed());
        assert!(policy.check_command("cargo fmt").is_allowed());
    }
}
