//! Deliberation outcome

use super::proposal::Proposal;
use super::round::DeliberationRound;
use serde::{Deserialize, Serialize};

/// Result of a full deliberation.
///
/// `converged` and `passed` are independent: consensus can settle below the
/// acceptance threshold. `halted` means the round cap was reached without
/// acceptance or convergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationOutcome {
    pub passed: bool,
    pub consensus: f64,
    pub rounds: Vec<DeliberationRound>,
    pub proposals: Vec<Proposal>,
    pub final_proposal: Option<Proposal>,
    pub vetoed_by: Vec<String>,
    pub converged: bool,
    pub halted: bool,
    pub total_cost: f64,
}

impl DeliberationOutcome {
    /// Outcome for an empty roster: accepted without review.
    pub fn auto_pass(proposal: Proposal, total_cost: f64) -> Self {
        Self {
            passed: true,
            consensus: 1.0,
            rounds: Vec::new(),
            proposals: vec![proposal.clone()],
            final_proposal: Some(proposal),
            vetoed_by: Vec::new(),
            converged: true,
            halted: false,
            total_cost,
        }
    }

    pub fn last_round(&self) -> Option<&DeliberationRound> {
        self.rounds.last()
    }

    /// Final artifact text, if any proposal exists.
    pub fn artifact(&self) -> Option<&str> {
        self.final_proposal.as_ref().map(|p| p.content.as_str())
    }

    /// One-line summary for logs and CLI output.
    pub fn summary(&self) -> String {
        let status = if self.passed {
            "passed"
        } else if self.halted {
            "halted"
        } else if self.converged {
            "converged without acceptance"
        } else {
            "rejected"
        };
        let mut line = format!(
            "{} after {} round(s), consensus {:.2}",
            status,
            self.rounds.len(),
            self.consensus
        );
        if !self.vetoed_by.is_empty() {
            line.push_str(&format!(", vetoed by {}", self.vetoed_by.join(", ")));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_pass() {
        let outcome = DeliberationOutcome::auto_pass(Proposal::new("input", "code", 1), 0.0);
        assert!(outcome.passed);
        assert_eq!(outcome.consensus, 1.0);
        assert_eq!(outcome.artifact(), Some("code"));
        assert_eq!(outcome.summary(), "passed after 0 round(s), consensus 1.00");
    }
}
