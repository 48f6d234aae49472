//! Safety gating for model-proposed actions.
//!
//! Two checks run before any action reaches the toolbox:
//!
//! 1. Deny-list: destructive command patterns (recursive root deletion, raw
//!    device writes, mass table drops, disk formatting) block the action.
//! 2. Write allow-list: `write_file` targets must resolve under the working
//!    directory and outside the protected path set.
//!
//! Paths are normalized lexically; symlinks are not followed. A relative
//! working directory is anchored at the process's current directory when
//! the policy is built.

use super::action::Action;
use crate::core::error::DomainError;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

/// Destructive-operation patterns blocked by default.
pub const DEFAULT_DENY_PATTERNS: &[&str] = &[
    // rm targeting the filesystem root or the home directory
    r"\brm\s+(?:-\S+\s+)*(?:/\*?|~/?|\$HOME/?)(?:\s|;|&|\||$)",
    // raw device writes
    r"\bdd\b.*\bof=/dev/(?:sd|hd|nvme|disk|mmcblk|xvd|vd)",
    r">\s*/dev/(?:sd|hd|nvme|disk|mmcblk|xvd|vd)",
    // mass table drops
    r"(?i)\bdrop\s+(?:table|database|schema)\b",
    r"(?i)\btruncate\s+table\b",
    // disk formatting
    r"\bmkfs(?:\.\w+)?\b",
    r"(?i)\bformat\s+[a-z]:",
    r"\bwipefs\b",
    r"\bfdisk\s+/dev/",
    // fork bomb
    r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
    r"\bchmod\s+(?:-\S+\s+)*777\s+/(?:\s|$)",
];

/// Paths a write may never touch, matched against any path component.
pub const DEFAULT_PROTECTED_PATHS: &[&str] = &[".git", ".env", ".ssh", "Cargo.lock"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    Allowed,
    Blocked(String),
}

impl SafetyVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SafetyVerdict::Allowed)
    }
}

#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    deny: Vec<Regex>,
    working_dir: PathBuf,
    protected: Vec<String>,
}

impl SafetyPolicy {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let working_dir = if working_dir.is_absolute() {
            working_dir
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&working_dir))
                .unwrap_or(working_dir)
        };
        let deny = DEFAULT_DENY_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            deny,
            working_dir: normalize(&working_dir),
            protected: DEFAULT_PROTECTED_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Add extra deny patterns. Fails on the first invalid regex.
    pub fn with_deny_patterns(mut self, patterns: &[String]) -> Result<Self, DomainError> {
        for pattern in patterns {
            let regex = Regex::new(pattern)
                .map_err(|e| DomainError::InvalidPattern(format!("{}: {}", pattern, e)))?;
            self.deny.push(regex);
        }
        Ok(self)
    }

    pub fn with_protected_paths(mut self, paths: &[String]) -> Self {
        for path in paths {
            if !self.protected.contains(path) {
                self.protected.push(path.clone());
            }
        }
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn deny_pattern_count(&self) -> usize {
        self.deny.len()
    }

    /// Check a command line against the deny-list.
    pub fn check_command(&self, command: &str) -> SafetyVerdict {
        match self.deny.iter().find(|re| re.is_match(command)) {
            Some(re) => SafetyVerdict::Blocked(format!(
                "command matches destructive pattern `{}`",
                re.as_str()
            )),
            None => SafetyVerdict::Allowed,
        }
    }

    /// Check that a write target stays inside the working directory and
    /// avoids protected paths.
    pub fn check_write_path(&self, path: &str) -> SafetyVerdict {
        // Without an anchored root every path would pass the prefix test
        if !self.working_dir.is_absolute() {
            return SafetyVerdict::Blocked(format!(
                "write to {} refused: working directory {} is not absolute",
                path,
                self.working_dir.display()
            ));
        }

        let candidate = Path::new(path);
        let resolved = if candidate.is_absolute() {
            normalize(candidate)
        } else {
            normalize(&self.working_dir.join(candidate))
        };

        if !resolved.starts_with(&self.working_dir) {
            return SafetyVerdict::Blocked(format!(
                "write to {} is outside the working directory",
                path
            ));
        }

        let relative = resolved
            .strip_prefix(&self.working_dir)
            .unwrap_or(resolved.as_path());
        for protected in &self.protected {
            let hit = if protected.contains('/') {
                let protected_path = Path::new(protected.trim_start_matches('/'));
                relative.starts_with(protected_path) || resolved.starts_with(protected)
            } else {
                relative
                    .components()
                    .any(|c| c.as_os_str() == protected.as_str())
            };
            if hit {
                return SafetyVerdict::Blocked(format!(
                    "write to {} touches protected path {}",
                    path, protected
                ));
            }
        }
        SafetyVerdict::Allowed
    }

    /// Check an action before dispatch.
    pub fn check_action(&self, action: &Action) -> SafetyVerdict {
        let verdict = self.check_command(&action.argument());
        if !verdict.is_allowed() {
            return verdict;
        }
        match action {
            Action::WriteFile { path, .. } => self.check_write_path(path),
            _ => SafetyVerdict::Allowed,
        }
    }
}

/// Lexically normalize a path: drop `.` and resolve `..` against prior
/// components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SafetyPolicy {
        SafetyPolicy::new("/work/project")
    }

    #[test]
    fn test_default_patterns_all_compile() {
        assert_eq!(policy().deny_pattern_count(), DEFAULT_DENY_PATTERNS.len());
    }

    #[test]
    fn test_blocks_destructive_commands() {
        let p = policy();
        for cmd in [
            "rm -rf /",
            "sudo rm -rf --no-preserve-root / ",
            "rm -rf ~",
            "dd if=/dev/zero of=/dev/sda bs=1M",
            "cat image > /dev/nvme0n1",
            "psql -c 'DROP TABLE users'",
            "mkfs.ext4 /dev/sdb1",
            "format C:",
            ":(){ :|:& };:",
        ] {
            assert!(!p.check_command(cmd).is_allowed(), "should block: {}", cmd);
        }
    }

    #[test]
    fn test_allows_ordinary_commands() {
        let p = policy();
        for cmd in [
            "rm -rf ./target",
            "rm build/output.txt",
            "ls -la /",
            "cargo test",
            "echo dropped table count",
        ] {
            assert!(p.check_command(cmd).is_allowed(), "should allow: {}", cmd);
        }
    }

    #[test]
    fn test_write_path_allow_list() {
        let p = policy();
        assert!(p.check_write_path("src/lib.rs").is_allowed());
        assert!(p.check_write_path("/work/project/docs/a.md").is_allowed());
        assert!(!p.check_write_path("../other/file").is_allowed());
        assert!(!p.check_write_path("/etc/passwd").is_allowed());
        assert!(!p.check_write_path("src/../../escape").is_allowed());
    }

    #[test]
    fn test_relative_working_dir_is_anchored() {
        let p = SafetyPolicy::new(".");
        let cwd = std::env::current_dir().unwrap();
        assert!(p.working_dir().is_absolute());
        assert_eq!(p.working_dir(), normalize(&cwd));

        assert!(p.check_write_path("notes/out.md").is_allowed());
        assert!(!p.check_write_path("/etc/passwd").is_allowed());
        assert!(!p.check_write_path("../x").is_allowed());
        assert!(!p.check_write_path("../../outside").is_allowed());
        assert!(!p.check_write_path("a/../../x").is_allowed());
    }

    #[test]
    fn test_normalize_keeps_leading_parent_dirs() {
        assert_eq!(normalize(Path::new("./a/../../x")), PathBuf::from("../x"));
        assert_eq!(normalize(Path::new("/a/../../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new(".")), PathBuf::new());
    }

    #[test]
    fn test_write_path_protected() {
        let p = policy().with_protected_paths(&["secrets/".to_string()]);
        assert!(!p.check_write_path(".git/config").is_allowed());
        assert!(!p.check_write_path("nested/.env").is_allowed());
        assert!(!p.check_write_path("Cargo.lock").is_allowed());
        assert!(!p.check_write_path("secrets/key.pem").is_allowed());
        assert!(p.check_write_path("src/environment.rs").is_allowed());
    }

    #[test]
    fn test_check_action() {
        let p = policy();
        let write = Action::WriteFile {
            path: "/tmp/x".to_string(),
            content: "hi".to_string(),
        };
        assert!(!p.check_action(&write).is_allowed());

        let shell = Action::Shell {
            command: "rm -rf /*".to_string(),
        };
        assert!(!p.check_action(&shell).is_allowed());

        let read = Action::ReadFile {
            path: "README.md".to_string(),
        };
        assert_eq!(p.check_action(&read), SafetyVerdict::Allowed);
    }

    #[test]
    fn test_invalid_extra_pattern() {
        let result = policy().with_deny_patterns(&["(unclosed".to_string()]);
        assert!(matches!(result, Err(DomainError::InvalidPattern(_))));
    }
}
