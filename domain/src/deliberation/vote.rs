//! Persona votes and weighted consensus

use super::persona::{Persona, clamp_weight};
use serde::{Deserialize, Serialize};

/// A single persona's vote on a proposal
///
/// # Example
///
/// ```
/// use conclave_domain::deliberation::{PersonaVote, weighted_consensus};
///
/// let votes = vec![
///     PersonaVote::approve("correctness", 0.6, "Logic holds."),
///     PersonaVote::reject("performance", 0.4, "Quadratic loop in hot path."),
/// ];
/// assert!((weighted_consensus(&votes) - 0.6).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaVote {
    pub persona: String,
    pub approve: bool,
    pub veto: bool,
    pub weight: f64,
    pub rationale: String,
    /// Cast on the persona's behalf because its model call failed.
    #[serde(default)]
    pub implicit: bool,
}

impl PersonaVote {
    fn new(
        persona: impl Into<String>,
        approve: bool,
        veto: bool,
        weight: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            persona: persona.into(),
            approve,
            veto,
            weight: clamp_weight(weight),
            rationale: rationale.into(),
            implicit: false,
        }
    }

    pub fn approve(persona: impl Into<String>, weight: f64, rationale: impl Into<String>) -> Self {
        Self::new(persona, true, false, weight, rationale)
    }

    pub fn reject(persona: impl Into<String>, weight: f64, rationale: impl Into<String>) -> Self {
        Self::new(persona, false, false, weight, rationale)
    }

    /// A veto. Always a rejection.
    pub fn veto(persona: impl Into<String>, weight: f64, rationale: impl Into<String>) -> Self {
        Self::new(persona, false, true, weight, rationale)
    }

    /// Approve-with-default-weight vote for a persona whose call failed.
    pub fn implicit_approve(persona: &Persona, reason: impl Into<String>) -> Self {
        let mut vote = Self::approve(&persona.name, persona.weight, reason);
        vote.implicit = true;
        vote
    }
}

/// `Σ approving weight / Σ weight`.
///
/// No votes, or only zero-weight votes, count as unanimous approval.
pub fn weighted_consensus(votes: &[PersonaVote]) -> f64 {
    let total: f64 = votes.iter().map(|v| v.weight).sum();
    if total <= 0.0 {
        return 1.0;
    }
    let approving: f64 = votes.iter().filter(|v| v.approve).map(|v| v.weight).sum();
    approving / total
}

/// Rejecting rationales, one `persona: rationale` block each.
pub fn rejection_feedback(votes: &[PersonaVote]) -> String {
    votes
        .iter()
        .filter(|v| !v.approve)
        .map(|v| format!("{}: {}", v.persona, v.rationale))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_consensus() {
        let votes = vec![
            PersonaVote::approve("a", 0.6, "ok"),
            PersonaVote::reject("b", 0.4, "no"),
        ];
        assert!((weighted_consensus(&votes) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_consensus_empty_or_weightless() {
        assert_eq!(weighted_consensus(&[]), 1.0);
        let votes = vec![PersonaVote::reject("a", 0.0, "no")];
        assert_eq!(weighted_consensus(&votes), 1.0);
    }

    #[test]
    fn test_veto_is_rejection() {
        let vote = PersonaVote::veto("security", 1.0, "leaks token");
        assert!(vote.veto);
        assert!(!vote.approve);
    }

    #[test]
    fn test_implicit_approve_uses_persona_weight() {
        let persona = Persona::new("perf", 0.5);
        let vote = PersonaVote::implicit_approve(&persona, "model unavailable");
        assert!(vote.approve);
        assert!(vote.implicit);
        assert_eq!(vote.weight, 0.5);
    }

    #[test]
    fn test_rejection_feedback() {
        let votes = vec![
            PersonaVote::approve("a", 1.0, "fine"),
            PersonaVote::reject("b", 1.0, "missing tests"),
            PersonaVote::veto("c", 1.0, "unsafe"),
        ];
        assert_eq!(
            rejection_feedback(&votes),
            "b: missing tests\n\nc: unsafe"
        );
    }
}
