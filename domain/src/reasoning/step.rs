//! Step log entries of a reasoning session.

use serde::{Deserialize, Serialize};

/// Prefix of observations produced by the safety gate.
pub const BLOCKED_PREFIX: &str = "BLOCKED:";

/// Result of dispatching one action.
///
/// Tool failures are ordinary observations with `is_error` set; the
/// strategy reads them like any other output and adapts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub text: String,
    pub is_error: bool,
    pub blocked: bool,
}

impl Observation {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
            blocked: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: format!("Error: {}", text.into()),
            is_error: true,
            blocked: false,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            text: format!("{} {}", BLOCKED_PREFIX, reason.into()),
            is_error: true,
            blocked: true,
        }
    }

    /// Whether this observation should be treated as a failed step.
    pub fn is_failure(&self) -> bool {
        self.is_error || self.blocked
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// One thought / action / observation triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub index: usize,
    pub thought: String,
    pub action: String,
    pub observation: Observation,
}

impl Step {
    pub fn new(
        index: usize,
        thought: impl Into<String>,
        action: impl Into<String>,
        observation: Observation,
    ) -> Self {
        Self {
            index,
            thought: thought.into(),
            action: action.into(),
            observation,
        }
    }

    /// Render the step the way it is fed back to the model.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.thought.is_empty() {
            out.push_str(&format!("Thought: {}\n", self.thought));
        }
        out.push_str(&format!("Action: {}\n", self.action));
        out.push_str(&format!("Observation: {}\n", self.observation));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_constructors() {
        assert!(!Observation::ok("fine").is_failure());

        let err = Observation::error("no such file");
        assert!(err.is_failure());
        assert_eq!(err.text, "Error: no such file");

        let blocked = Observation::blocked("rm -rf /");
        assert!(blocked.blocked);
        assert!(blocked.text.starts_with(BLOCKED_PREFIX));
    }

    #[test]
    fn test_step_render() {
        let step = Step::new(1, "look around", "ls[.]", Observation::ok("src"));
        assert_eq!(
            step.render(),
            "Thought: look around\nAction: ls[.]\nObservation: src\n"
        );
    }
}
