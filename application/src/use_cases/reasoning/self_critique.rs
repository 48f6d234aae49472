//! Self-critique strategy: short iterative attempts, each reflected on,
//! with the lessons of failed attempts fed into the next one.
//!
//! When no attempt is confirmed, the answer whose reflection raised the
//! fewest problems is returned; ties go to the later attempt.

use super::types::{Attempt, ReasoningError};
use super::ReasoningExecutor;
use crate::ports::model_service::ModelService;
use conclave_domain::reasoning::response::parse_reflection;
use conclave_domain::{ReasoningPromptTemplate, ReasoningSession, Task};
use tracing::{debug, info};

impl<M: ModelService + 'static> ReasoningExecutor<M> {
    pub(super) async fn run_self_critique(
        &self,
        task: &Task,
        session: &mut ReasoningSession,
    ) -> Result<Attempt, ReasoningError> {
        let attempts = self.params.critique_attempts.max(1);
        // (attempt, problems its reflection raised)
        let mut best: Option<(Attempt, usize)> = None;

        for attempt_no in 1..=attempts {
            session.clear_steps();
            let attempt_task = task.with_lessons(&session.lessons());

            let attempt = match self
                .run_iterative(&attempt_task, session, self.params.critique_inner_steps)
                .await
            {
                Ok(attempt) if !attempt.complete => return Ok(attempt),
                Ok(attempt) => Some(attempt),
                Err(ReasoningError::StepLimit(_)) => None,
                Err(e) => return Err(e),
            };

            let prompt = ReasoningPromptTemplate::reflect(
                &attempt_task,
                &session.transcript(),
                attempt.as_ref().map(|a| a.answer.as_str()),
            );
            let reply = self
                .ask(session, self.request(prompt, self.params.review_tier))
                .await?;
            let reflection = parse_reflection(&reply.content);
            debug!(
                "Attempt {}/{} reflection: success={} lessons={}",
                attempt_no,
                attempts,
                reflection.success,
                reflection.lessons.len()
            );
            let success = reflection.success;
            let problems = reflection.lessons.len();
            session.add_reflection(reflection);

            match attempt {
                Some(attempt) if success => return Ok(attempt),
                Some(attempt) => {
                    if best.as_ref().is_none_or(|(_, fewest)| problems <= *fewest) {
                        best = Some((attempt, problems));
                    }
                }
                None => {}
            }
        }

        match best {
            Some((attempt, problems)) => {
                info!(
                    "No attempt passed reflection; returning the answer with the fewest problems ({})",
                    problems
                );
                Ok(Attempt::partial(attempt.answer))
            }
            None => Err(ReasoningError::AttemptsExhausted(attempts)),
        }
    }
}
