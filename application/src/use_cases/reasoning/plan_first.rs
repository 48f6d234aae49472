//! Plan-first strategy: plan every step up front, execute, re-plan once on
//! failure, then synthesize.

use super::types::{Attempt, ReasoningError};
use super::{LineResult, ReasoningExecutor};
use crate::ports::model_service::ModelService;
use conclave_domain::reasoning::response::parse_numbered_plan;
use conclave_domain::{ReasoningPromptTemplate, ReasoningSession, Task};
use std::collections::VecDeque;
use tracing::{info, warn};

impl<M: ModelService + 'static> ReasoningExecutor<M> {
    pub(super) async fn run_plan_first(
        &self,
        task: &Task,
        session: &mut ReasoningSession,
    ) -> Result<Attempt, ReasoningError> {
        let reply = self
            .ask(
                session,
                self.request(ReasoningPromptTemplate::plan(task), self.params.step_tier),
            )
            .await?;
        let plan = parse_numbered_plan(&reply.content);
        if plan.is_empty() {
            return Err(ReasoningError::EmptyPlan);
        }
        info!("Plan has {} steps", plan.len());
        session.set_plan(plan.clone());

        let mut queue: VecDeque<String> = plan.into();
        let mut replanned = false;

        while let Some(line) = queue.pop_front() {
            if let Some(stop) = self.check_limits(task, session, self.params.max_steps)? {
                return Ok(stop);
            }

            let observation = match self.run_action_line(&line).await {
                LineResult::Finished(answer) => return Ok(Attempt::answered(answer)),
                LineResult::Observed(observation) => observation,
            };
            let failed = observation.is_failure();
            session.record_step("", line, observation);

            if failed && !replanned {
                replanned = true;
                let remaining: Vec<String> = queue.iter().cloned().collect();
                warn!("Plan step failed; re-planning {} remaining steps", remaining.len());
                let prompt =
                    ReasoningPromptTemplate::replan(task, &session.transcript(), &remaining);
                let reply = self
                    .ask(session, self.request(prompt, self.params.step_tier))
                    .await?;
                let revised = parse_numbered_plan(&reply.content);
                session.set_plan(revised.clone());
                queue = revised.into();
            }
        }

        let prompt = ReasoningPromptTemplate::synthesize(task, &session.transcript());
        let reply = self
            .ask(session, self.request(prompt, self.params.review_tier))
            .await?;
        Ok(Attempt::answered(reply.content.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReasoningParams;
    use crate::use_cases::scripted::{RecordingToolbox, ScriptedModel, text};
    use conclave_domain::{Action, Observation, SafetyPolicy, Strategy};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_replans_once_after_failure() {
        let toolbox = Arc::new(RecordingToolbox::with_observations(vec![
            Observation::ok("listing"),
            Observation::error("no such file"),
            Observation::ok("found it"),
            Observation::error("fails again"),
        ]));
        let model = Arc::new(ScriptedModel::new(vec![
            text("1. list_dir[.]\n2. read_file[missing.rs]\n3. read_file[never.rs]"),
            text("1. search[main]\n2. read_file[other.rs]"),
            text("the answer"),
        ]));
        let exec = ReasoningExecutor::new(
            model.clone(),
            toolbox.clone(),
            SafetyPolicy::new("/work"),
            ReasoningParams::default(),
        );
        let mut session = ReasoningSession::new(Strategy::PlanFirst);

        let attempt = exec
            .run_plan_first(&Task::new("x"), &mut session)
            .await
            .unwrap();

        assert_eq!(attempt.answer, "the answer");
        // the second failure does not trigger another re-plan
        assert_eq!(model.requests().len(), 3);
        assert_eq!(session.step_count(), 4);
        let calls = toolbox.calls();
        assert_eq!(calls[2], Action::Search { query: "main".into() });
        assert!(!calls.contains(&Action::ReadFile { path: "never.rs".into() }));
        assert!(model.requests()[1].prompt.contains("read_file[never.rs]"));
    }

    #[tokio::test]
    async fn test_empty_plan_is_an_error() {
        let exec = ReasoningExecutor::new(
            Arc::new(ScriptedModel::new(vec![text("I would rather not")])),
            Arc::new(RecordingToolbox::new()),
            SafetyPolicy::new("/work"),
            ReasoningParams::default(),
        );
        let mut session = ReasoningSession::new(Strategy::PlanFirst);

        let err = exec
            .run_plan_first(&Task::new("x"), &mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::EmptyPlan));
    }
}
