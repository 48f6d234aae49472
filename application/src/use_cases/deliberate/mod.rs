//! Deliberation use case
//!
//! Independent proposals from several participant models are reviewed by a
//! roster of weighted personas over up to `max_rounds` rounds.
//!
//! # Flow
//!
//! ```text
//! 1. Proposal phase: each available participant drafts a proposal
//!    (stops early at the cost ceiling)
//! 2. (refine_code only) Arbitration: the arbiter merges the proposals
//! 3. Round loop:
//!    ├── veto personas vote first; a veto ends the round
//!    ├── advisory personas vote one after another
//!    ├── accepted            → passed
//!    ├── |Δ consensus| < δ   → converged
//!    ├── round cap reached   → halted
//!    └── otherwise synthesize a revision from the rejections
//! ```

pub mod types;

pub use types::DeliberationError;

use crate::config::CouncilParams;
use crate::ports::artifact_reviewer::ArtifactReviewer;
use crate::ports::event_log::{EventLog, NoEventLog, OrchestrationEvent};
use crate::ports::model_service::{ModelRequest, ModelService};
use async_trait::async_trait;
use conclave_domain::deliberation::{parse_persona_vote, rejection_feedback, split_roster};
use conclave_domain::{
    CouncilPromptTemplate, DeliberationOutcome, DeliberationRound, Persona, PersonaVote, Proposal,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Producer name for an artifact reviewed as given.
const INPUT_PRODUCER: &str = "input";

/// Runs council deliberations
pub struct DeliberationEngine<M: ModelService + 'static> {
    model: Arc<M>,
    params: CouncilParams,
    event_log: Arc<dyn EventLog>,
}

/// How a round loop ended
struct RoundsEnd {
    passed: bool,
    converged: bool,
    halted: bool,
}

impl<M: ModelService + 'static> DeliberationEngine<M> {
    pub fn new(model: Arc<M>, params: CouncilParams) -> Self {
        Self {
            model,
            params,
            event_log: Arc::new(NoEventLog),
        }
    }

    pub fn with_event_log(mut self, event_log: Arc<dyn EventLog>) -> Self {
        self.event_log = event_log;
        self
    }

    pub fn params(&self) -> &CouncilParams {
        &self.params
    }

    /// Draft proposals for an artifact, then review the first one.
    pub async fn deliberate(
        &self,
        artifact: &str,
        context: Option<&str>,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        ensure_artifact(artifact)?;
        let mut cost = 0.0;
        let proposals = self.collect_proposals(artifact, context, &mut cost).await;
        let initial = proposals
            .first()
            .cloned()
            .unwrap_or_else(|| Proposal::new(INPUT_PRODUCER, artifact, 1));
        Ok(self.run_rounds(initial, proposals, cost).await)
    }

    /// Draft proposals for a piece of code, merge them through the arbiter,
    /// then review the merge.
    pub async fn refine_code(
        &self,
        code: &str,
        context: Option<&str>,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        ensure_artifact(code)?;
        let mut cost = 0.0;
        let mut proposals = self.collect_proposals(code, context, &mut cost).await;
        let initial = match proposals.len() {
            0 => Proposal::new(INPUT_PRODUCER, code, 1),
            1 => proposals[0].clone(),
            _ => {
                let merged = self.arbitrate(code, &proposals, &mut cost).await;
                if !proposals.contains(&merged) {
                    proposals.push(merged.clone());
                }
                merged
            }
        };
        Ok(self.run_rounds(initial, proposals, cost).await)
    }

    /// Review an artifact as given, without a proposal phase.
    pub async fn review(&self, artifact: &str) -> Result<DeliberationOutcome, DeliberationError> {
        ensure_artifact(artifact)?;
        let initial = Proposal::new(INPUT_PRODUCER, artifact, 1);
        Ok(self.run_rounds(initial.clone(), vec![initial], 0.0).await)
    }

    // ==================== Phases ====================

    async fn collect_proposals(
        &self,
        artifact: &str,
        context: Option<&str>,
        cost: &mut f64,
    ) -> Vec<Proposal> {
        let prompt = CouncilPromptTemplate::proposal(artifact, context);
        let mut proposals = Vec::new();

        for (i, participant) in self.params.participants.iter().enumerate() {
            if *cost >= self.params.cost_ceiling {
                warn!(
                    "Cost ceiling ${:.2} reached; skipping {} participant(s)",
                    self.params.cost_ceiling,
                    self.params.participants.len() - i
                );
                break;
            }
            if !self.model.is_available(participant) {
                warn!("Skipping {}: circuit open", participant);
                continue;
            }

            let request = ModelRequest::new(prompt.clone())
                .with_model(participant.clone())
                .with_tier(self.params.synthesis_tier);
            match self.model.ask(request).await {
                Ok(reply) => {
                    *cost += reply.cost;
                    debug!("{} proposed {} chars", participant, reply.content.len());
                    proposals.push(Proposal::new(participant.as_str(), reply.content.trim(), 1));
                }
                Err(e) => warn!("{} failed to propose: {}", participant, e),
            }
        }

        info!(
            "Proposal phase: {} of {} participants answered",
            proposals.len(),
            self.params.participants.len()
        );
        proposals
    }

    /// Merge proposals through the arbiter; the first proposal stands in when
    /// there is no usable arbiter.
    async fn arbitrate(&self, original: &str, proposals: &[Proposal], cost: &mut f64) -> Proposal {
        let first = proposals[0].clone();
        let Some(arbiter) = self.params.arbiter.as_ref() else {
            return first;
        };
        if !self.model.is_available(arbiter) {
            warn!("Arbiter {} unavailable; keeping the first proposal", arbiter);
            return first;
        }

        let request = ModelRequest::new(CouncilPromptTemplate::arbitrate(original, proposals))
            .with_model(arbiter.clone())
            .with_tier(self.params.synthesis_tier);
        match self.model.ask(request).await {
            Ok(reply) => {
                *cost += reply.cost;
                info!("Arbiter {} merged {} proposals", arbiter, proposals.len());
                Proposal::new(arbiter.as_str(), reply.content.trim(), 1)
            }
            Err(e) => {
                warn!("Arbitration failed: {}; keeping the first proposal", e);
                first
            }
        }
    }

    async fn run_rounds(
        &self,
        initial: Proposal,
        mut proposals: Vec<Proposal>,
        mut cost: f64,
    ) -> DeliberationOutcome {
        if self.params.roster.is_empty() {
            info!("Empty roster; accepting the proposal without review");
            let mut outcome = DeliberationOutcome::auto_pass(initial, cost);
            if !proposals.is_empty() {
                outcome.proposals = proposals;
            }
            return outcome;
        }

        let max_rounds = self.params.max_rounds.max(1);
        let mut rounds: Vec<DeliberationRound> = Vec::new();
        let mut current = initial;
        let mut previous: Option<f64> = None;

        let end = loop {
            let votes = self.collect_votes(&current, &mut cost).await;
            let round = DeliberationRound::tally(current.round, votes, self.params.threshold);
            info!(
                "Round {}: {} consensus {:.2} -> {}",
                round.round,
                round.vote_summary(),
                round.consensus,
                round.verdict
            );
            self.event_log.log(OrchestrationEvent::new(
                "council_round",
                serde_json::json!({
                    "round": round.round,
                    "consensus": round.consensus,
                    "verdict": round.verdict.to_string(),
                    "vetoed_by": round.vetoed_by,
                }),
            ));

            let consensus = round.consensus;
            let accepted = round.verdict.is_accepted();
            let feedback = rejection_feedback(&round.votes);
            rounds.push(round);

            if accepted {
                break RoundsEnd { passed: true, converged: false, halted: false };
            }
            if previous.is_some_and(|p| (consensus - p).abs() < self.params.convergence_delta) {
                info!("Consensus converged at {:.2}", consensus);
                break RoundsEnd { passed: false, converged: true, halted: false };
            }
            previous = Some(consensus);

            let Ok(next) = current.revise(current.producer.clone(), "", max_rounds) else {
                info!("Round cap of {} reached", max_rounds);
                break RoundsEnd { passed: false, converged: false, halted: true };
            };
            if cost >= self.params.cost_ceiling {
                warn!("Cost ceiling ${:.2} reached; halting", self.params.cost_ceiling);
                break RoundsEnd { passed: false, converged: false, halted: true };
            }

            current = self.synthesize(&current, next, &feedback, &mut cost).await;
            proposals.push(current.clone());
        };

        let (consensus, vetoed_by) = rounds
            .last()
            .map(|r| (r.consensus, r.vetoed_by.clone()))
            .unwrap_or((1.0, Vec::new()));
        let outcome = DeliberationOutcome {
            passed: end.passed,
            consensus,
            rounds,
            proposals,
            final_proposal: Some(current),
            vetoed_by,
            converged: end.converged,
            halted: end.halted,
            total_cost: cost,
        };
        info!("Deliberation {}", outcome.summary());
        outcome
    }

    /// Personas vote one at a time, veto holders first; a veto ends the
    /// round before any advisory persona is asked.
    async fn collect_votes(&self, proposal: &Proposal, cost: &mut f64) -> Vec<PersonaVote> {
        let (veto, advisory) = split_roster(&self.params.roster, self.params.personas_per_group);
        let mut votes = Vec::with_capacity(veto.len() + advisory.len());

        for persona in veto {
            let (vote, spent) = self.ask_persona(persona, proposal).await;
            *cost += spent;
            let vetoed = vote.veto;
            votes.push(vote);
            if vetoed {
                info!("{} vetoed; remaining personas skipped", persona.name);
                return votes;
            }
        }

        for persona in advisory {
            let (vote, spent) = self.ask_persona(persona, proposal).await;
            *cost += spent;
            votes.push(vote);
        }
        votes
    }

    async fn ask_persona(&self, persona: &Persona, proposal: &Proposal) -> (PersonaVote, f64) {
        let request = ModelRequest::new(CouncilPromptTemplate::review(persona, proposal))
            .with_system(CouncilPromptTemplate::persona_system(persona))
            .with_tier(self.params.persona_tier);
        match self.model.ask(request).await {
            Ok(reply) => (parse_persona_vote(persona, &reply.content), reply.cost),
            Err(e) => {
                warn!("{} review failed: {}; counting as approval", persona.name, e);
                (
                    PersonaVote::implicit_approve(persona, format!("review unavailable: {}", e)),
                    0.0,
                )
            }
        }
    }

    /// Fill in the next round's proposal from the rejections. A failed
    /// synthesis carries the current content forward unchanged.
    async fn synthesize(
        &self,
        current: &Proposal,
        mut next: Proposal,
        feedback: &str,
        cost: &mut f64,
    ) -> Proposal {
        let request = ModelRequest::new(CouncilPromptTemplate::synthesize(current, feedback))
            .with_tier(self.params.synthesis_tier);
        match self.model.ask(request).await {
            Ok(reply) => {
                *cost += reply.cost;
                next.producer = reply.model.as_str().to_string();
                next.content = reply.content.trim().to_string();
            }
            Err(e) => {
                warn!("Synthesis failed: {}; re-reviewing the current proposal", e);
                next.content = current.content.clone();
            }
        }
        next
    }
}

fn ensure_artifact(artifact: &str) -> Result<(), DeliberationError> {
    if artifact.trim().is_empty() {
        return Err(DeliberationError::EmptyArtifact);
    }
    Ok(())
}

#[async_trait]
impl<M: ModelService + 'static> ArtifactReviewer for DeliberationEngine<M> {
    async fn review_artifact(
        &self,
        artifact: &str,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        self.review(artifact).await
    }
}
