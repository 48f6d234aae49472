//! Model-backed decision service for the prioritize phase.

use crate::ports::decision::DecisionService;
use crate::ports::model_service::{ModelRequest, ModelService};
use async_trait::async_trait;
use conclave_domain::{AutonomyPromptTemplate, CandidateActionSet, Tier};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ModelDecisionService<M: ModelService + 'static> {
    model: Arc<M>,
    tier: Tier,
}

impl<M: ModelService + 'static> ModelDecisionService<M> {
    pub fn new(model: Arc<M>, tier: Tier) -> Self {
        Self { model, tier }
    }
}

#[async_trait]
impl<M: ModelService + 'static> DecisionService for ModelDecisionService<M> {
    async fn choose(
        &self,
        candidates: &[CandidateActionSet],
        questions: &[String],
    ) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let request = ModelRequest::new(AutonomyPromptTemplate::decide(candidates, questions))
            .with_tier(self.tier);
        match self.model.ask(request).await {
            Ok(reply) => {
                let choice = parse_choice(&reply.content, candidates.len());
                debug!("Model chose candidate {:?}", choice);
                choice
            }
            Err(e) => {
                warn!("Decision call failed: {}", e);
                None
            }
        }
    }
}

/// First number in the reply, read as a 1-based candidate index.
fn parse_choice(reply: &str, len: usize) -> Option<usize> {
    let digits: String = reply
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let n: usize = digits.parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}
