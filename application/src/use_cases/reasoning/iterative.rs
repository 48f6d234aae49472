//! Iterative strategy: one thought/action/observation step at a time.

use super::types::{Attempt, ReasoningError};
use super::{LineResult, ReasoningExecutor};
use crate::ports::model_service::ModelService;
use conclave_domain::reasoning::response::parse_step_response;
use conclave_domain::{Observation, ReasoningPromptTemplate, ReasoningSession, Task};
use tracing::debug;

const NO_ACTION_HINT: &str =
    "no action found; reply with `Action: tool[argument]` or `Final Answer: ...`";

impl<M: ModelService + 'static> ReasoningExecutor<M> {
    /// Loop until a final answer, the step limit, the time limit or the budget.
    pub(super) async fn run_iterative(
        &self,
        task: &Task,
        session: &mut ReasoningSession,
        max_steps: usize,
    ) -> Result<Attempt, ReasoningError> {
        loop {
            if let Some(stop) = self.check_limits(task, session, max_steps)? {
                return Ok(stop);
            }

            let prompt = ReasoningPromptTemplate::next_step(task, &session.transcript());
            let reply = self
                .ask(session, self.request(prompt, self.params.step_tier))
                .await?;
            let parsed = parse_step_response(&reply.content);

            if let Some(answer) = parsed.final_answer {
                return Ok(Attempt::answered(answer));
            }

            let Some(line) = parsed.action else {
                session.record_step(parsed.thought, "(none)", Observation::error(NO_ACTION_HINT));
                continue;
            };

            match self.run_action_line(&line).await {
                LineResult::Finished(answer) => return Ok(Attempt::answered(answer)),
                LineResult::Observed(observation) => {
                    debug!("Step {}: {} -> {}", session.step_count() + 1, line, observation);
                    session.record_step(parsed.thought, line, observation);
                }
            }
        }
    }
}
