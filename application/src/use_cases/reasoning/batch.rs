//! Batch strategy: a labeled plan whose later steps reference earlier
//! outputs by placeholder, executed without intermediate model calls.

use super::types::{Attempt, ReasoningError};
use super::{LineResult, ReasoningExecutor};
use crate::ports::model_service::ModelService;
use conclave_domain::reasoning::response::{
    PlannedAction, parse_batch_plan, parse_numbered_plan, substitute_placeholders,
};
use conclave_domain::{ReasoningPromptTemplate, ReasoningSession, Task};
use std::collections::BTreeMap;
use tracing::info;

impl<M: ModelService + 'static> ReasoningExecutor<M> {
    pub(super) async fn run_batch(
        &self,
        task: &Task,
        session: &mut ReasoningSession,
    ) -> Result<Attempt, ReasoningError> {
        let reply = self
            .ask(
                session,
                self.request(ReasoningPromptTemplate::batch_plan(task), self.params.step_tier),
            )
            .await?;
        let plan = batch_plan_from(&reply.content);
        if plan.is_empty() {
            return Err(ReasoningError::EmptyPlan);
        }
        info!("Batch plan has {} calls", plan.len());
        session.set_plan(plan.iter().map(|p| p.action.clone()).collect());

        let mut outputs: BTreeMap<String, String> = BTreeMap::new();
        for planned in plan {
            if let Some(stop) = self.check_limits(task, session, self.params.max_steps)? {
                return Ok(stop);
            }
            let line = substitute_placeholders(&planned.action, &outputs);
            let observation = match self.run_action_line(&line).await {
                LineResult::Finished(answer) => return Ok(Attempt::answered(answer)),
                LineResult::Observed(observation) => observation,
            };
            outputs.insert(planned.label.clone(), observation.text.clone());
            session.record_step(planned.label, line, observation);
        }

        let prompt = ReasoningPromptTemplate::synthesize(task, &session.transcript());
        let reply = self
            .ask(session, self.request(prompt, self.params.review_tier))
            .await?;
        Ok(Attempt::answered(reply.content.trim()))
    }
}

/// Labeled plan, or a numbered plan labeled `#E1..` when the model ignored
/// the placeholder format.
fn batch_plan_from(response: &str) -> Vec<PlannedAction> {
    let plan = parse_batch_plan(response);
    if !plan.is_empty() {
        return plan;
    }
    parse_numbered_plan(response)
        .into_iter()
        .enumerate()
        .map(|(i, action)| PlannedAction {
            label: format!("#E{}", i + 1),
            action,
        })
        .collect()
}
