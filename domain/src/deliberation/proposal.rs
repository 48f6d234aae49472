//! Candidate artifacts under deliberation

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Participant (model or role) that produced the content.
    pub producer: String,
    pub content: String,
    /// Round the proposal is reviewed in (1-indexed).
    pub round: usize,
}

impl Proposal {
    pub fn new(producer: impl Into<String>, content: impl Into<String>, round: usize) -> Self {
        Self {
            producer: producer.into(),
            content: content.into(),
            round: round.max(1),
        }
    }

    /// Revision for the next round. Fails if that round would exceed `round_cap`.
    pub fn revise(
        &self,
        producer: impl Into<String>,
        content: impl Into<String>,
        round_cap: usize,
    ) -> Result<Proposal, DomainError> {
        let next = self.round + 1;
        if next > round_cap {
            return Err(DomainError::InvalidState(format!(
                "round {} exceeds cap {}",
                next, round_cap
            )));
        }
        Ok(Proposal::new(producer, content, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revise_increments_round() {
        let p = Proposal::new("gpt", "v1", 1);
        let r = p.revise("synthesis", "v2", 3).unwrap();
        assert_eq!(r.round, 2);
        assert_eq!(r.content, "v2");
    }

    #[test]
    fn test_revise_respects_cap() {
        let p = Proposal::new("gpt", "v3", 3);
        assert!(p.revise("synthesis", "v4", 3).is_err());
    }

    #[test]
    fn test_round_zero_becomes_one() {
        assert_eq!(Proposal::new("x", "y", 0).round, 1);
    }
}
