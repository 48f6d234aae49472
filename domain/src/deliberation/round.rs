//! Deliberation rounds

use super::vote::{PersonaVote, weighted_consensus};
use serde::{Deserialize, Serialize};

/// Verdict of a round against the acceptance threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "Accepted"),
            Verdict::Rejected => write!(f, "Rejected"),
        }
    }
}

/// One round of persona voting
///
/// Any veto forces [`Verdict::Rejected`] regardless of the weighted
/// consensus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationRound {
    /// Round number (1-indexed)
    pub round: usize,
    pub votes: Vec<PersonaVote>,
    pub consensus: f64,
    pub verdict: Verdict,
    pub vetoed_by: Vec<String>,
}

impl DeliberationRound {
    pub fn tally(round: usize, votes: Vec<PersonaVote>, threshold: f64) -> Self {
        let consensus = weighted_consensus(&votes);
        let vetoed_by: Vec<String> = votes
            .iter()
            .filter(|v| v.veto)
            .map(|v| v.persona.clone())
            .collect();
        let verdict = if vetoed_by.is_empty() && consensus >= threshold {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };
        Self {
            round,
            votes,
            consensus,
            verdict,
            vetoed_by,
        }
    }

    pub fn is_vetoed(&self) -> bool {
        !self.vetoed_by.is_empty()
    }

    /// Generate a visual vote summary (e.g., "[●○✕]")
    pub fn vote_summary(&self) -> String {
        let mut summary = String::from("[");
        for vote in &self.votes {
            summary.push(match (vote.veto, vote.approve) {
                (true, _) => '✕',
                (false, true) => '●',
                (false, false) => '○',
            });
        }
        summary.push(']');
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_rejected() {
        let round = DeliberationRound::tally(
            1,
            vec![
                PersonaVote::approve("a", 0.6, ""),
                PersonaVote::reject("b", 0.4, ""),
            ],
            0.70,
        );
        assert!((round.consensus - 0.6).abs() < 1e-9);
        assert_eq!(round.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_veto_overrides_consensus() {
        let round = DeliberationRound::tally(
            2,
            vec![
                PersonaVote::approve("a", 1.0, ""),
                PersonaVote::approve("b", 1.0, ""),
                PersonaVote::veto("security", 0.1, "secret in logs"),
            ],
            0.5,
        );
        assert!(round.consensus > 0.9);
        assert_eq!(round.verdict, Verdict::Rejected);
        assert_eq!(round.vetoed_by, vec!["security"]);
        assert_eq!(round.vote_summary(), "[●●✕]");
    }

    #[test]
    fn test_empty_round_accepted() {
        let round = DeliberationRound::tally(1, vec![], 0.7);
        assert_eq!(round.consensus, 1.0);
        assert!(round.verdict.is_accepted());
    }
}
