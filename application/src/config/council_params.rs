//! Council parameters: deliberation control.

use conclave_domain::{ModelId, Persona, Tier};
use serde::{Deserialize, Serialize};

/// Deliberation control parameters.
///
/// The roster is injected here rather than fixed in the engine; an empty
/// roster makes every deliberation pass on its first proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilParams {
    /// Models asked for independent proposals.
    pub participants: Vec<ModelId>,
    /// Model that merges proposals in `refine_code`.
    pub arbiter: Option<ModelId>,
    pub roster: Vec<Persona>,
    pub max_rounds: usize,
    /// Weighted consensus needed to accept a round.
    pub threshold: f64,
    /// Consensus change below which consecutive rounds count as converged.
    pub convergence_delta: f64,
    /// Spend after which no further proposals or revisions are requested.
    pub cost_ceiling: f64,
    /// Personas consulted per group (veto and advisory) each round.
    pub personas_per_group: usize,
    pub persona_tier: Tier,
    pub synthesis_tier: Tier,
}

impl Default for CouncilParams {
    fn default() -> Self {
        Self {
            participants: Vec::new(),
            arbiter: None,
            roster: Persona::default_roster(),
            max_rounds: 3,
            threshold: 0.70,
            convergence_delta: 0.05,
            cost_ceiling: 1.0,
            personas_per_group: 3,
            persona_tier: Tier::Fast,
            synthesis_tier: Tier::Balanced,
        }
    }
}

impl CouncilParams {
    // ==================== Builder Methods ====================

    pub fn with_participants(mut self, participants: Vec<ModelId>) -> Self {
        self.participants = participants;
        self
    }

    pub fn with_arbiter(mut self, arbiter: ModelId) -> Self {
        self.arbiter = Some(arbiter);
        self
    }

    pub fn with_roster(mut self, roster: Vec<Persona>) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_convergence_delta(mut self, delta: f64) -> Self {
        self.convergence_delta = delta;
        self
    }

    pub fn with_cost_ceiling(mut self, ceiling: f64) -> Self {
        self.cost_ceiling = ceiling;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = CouncilParams::default();
        assert_eq!(params.max_rounds, 3);
        assert_eq!(params.threshold, 0.70);
        assert_eq!(params.convergence_delta, 0.05);
        assert_eq!(params.roster.len(), 5);
        assert!(params.participants.is_empty());
    }
}
