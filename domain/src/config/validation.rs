//! Structured configuration issues.
//!
//! Loaders collect issues instead of failing on the first problem so the
//! user sees everything that is wrong at once.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A model list contains an empty name.
    EmptyModelName,
    /// A tier has no models configured.
    EmptyTier,
    /// A persona weight lies outside `[0, 1]`.
    PersonaWeightOutOfRange,
    /// Heartbeat interval outside `[5s, 3600s]`; it will be clamped.
    IntervalOutOfRange,
    /// A ratio (threshold, fraction, delta) lies outside `[0, 1]`.
    RatioOutOfRange,
    /// A deny pattern is not a valid regex.
    InvalidPattern,
    /// A job is declared twice.
    DuplicateJob,
    /// A count that must be positive is zero.
    ZeroLimit,
    /// Models are configured without a command to reach them.
    MissingCommand,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = ConfigIssue::warning(
            ConfigIssueCode::IntervalOutOfRange,
            "heartbeat.interval_secs = 1 will be clamped to 5",
        );
        assert!(!issue.is_error());
        assert_eq!(
            issue.to_string(),
            "warning: heartbeat.interval_secs = 1 will be clamped to 5"
        );
    }
}
