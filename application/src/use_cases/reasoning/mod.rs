//! Reasoning use case
//!
//! Runs a [`Task`] with one of four strategies and degrades gracefully:
//! a failed strategy is retried once as [`Strategy::Iterative`], and if that
//! fails too (with at least one step taken) a direct tool-less query answers
//! instead.
//!
//! # Flow
//!
//! ```text
//! execute(task, strategy?)
//!   ├── primary strategy ──ok──────────────→ outcome (Primary)
//!   ├── iterative retry (counters reset) ──→ outcome (Iterative)
//!   └── direct query (if any step ran) ────→ outcome (DirectQuery)
//! ```
//!
//! Every action passes the [`SafetyPolicy`] before reaching the toolbox;
//! a blocked action becomes a `BLOCKED:` observation the model reads on its
//! next step.

mod batch;
mod iterative;
mod plan_first;
mod self_critique;
pub mod types;

pub use types::{FallbackStage, ReasoningError, ReasoningOutcome};

use crate::config::ReasoningParams;
use crate::ports::event_log::{EventLog, NoEventLog, OrchestrationEvent};
use crate::ports::model_service::{ModelReply, ModelRequest, ModelService};
use crate::ports::toolbox::Toolbox;
use crate::use_cases::agent_pool::TaskRunner;
use async_trait::async_trait;
use conclave_domain::core::string::truncate;
use conclave_domain::{
    Action, AgentResult, Observation, ReasoningPromptTemplate, ReasoningSession, SafetyPolicy,
    SafetyVerdict, Strategy, Task, Tier,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::Attempt;

enum LineResult {
    Observed(Observation),
    Finished(String),
}

/// Executes tasks with a reasoning strategy and a tool box
pub struct ReasoningExecutor<M: ModelService + 'static> {
    model: Arc<M>,
    toolbox: Arc<dyn Toolbox>,
    safety: SafetyPolicy,
    params: ReasoningParams,
    event_log: Arc<dyn EventLog>,
}

impl<M: ModelService + 'static> ReasoningExecutor<M> {
    pub fn new(
        model: Arc<M>,
        toolbox: Arc<dyn Toolbox>,
        safety: SafetyPolicy,
        params: ReasoningParams,
    ) -> Self {
        Self {
            model,
            toolbox,
            safety,
            params,
            event_log: Arc::new(NoEventLog),
        }
    }

    pub fn with_event_log(mut self, event_log: Arc<dyn EventLog>) -> Self {
        self.event_log = event_log;
        self
    }

    pub fn params(&self) -> &ReasoningParams {
        &self.params
    }

    /// Run a task to an answer.
    ///
    /// Never fails: every error is absorbed by the fallback cascade and
    /// reported through [`ReasoningOutcome::error`].
    pub async fn execute(&self, task: &Task, strategy: Option<Strategy>) -> ReasoningOutcome {
        let strategy = strategy.unwrap_or_else(|| Strategy::select_for(task.goal()));
        info!(
            "Reasoning on '{}' with {} strategy",
            truncate(task.goal(), 60),
            strategy
        );

        let mut session = ReasoningSession::new(strategy);
        let primary_error = match self.run_strategy(task, &mut session, strategy).await {
            Ok(attempt) => {
                return self.outcome(attempt, strategy, FallbackStage::Primary, &session, None);
            }
            Err(e) => e,
        };

        warn!("{} strategy failed: {}; retrying iteratively", strategy, primary_error);
        self.event_log.log(OrchestrationEvent::new(
            "strategy_fallback",
            serde_json::json!({
                "from": strategy.as_str(),
                "to": Strategy::Iterative.as_str(),
                "error": primary_error.to_string(),
            }),
        ));

        session.restart(Strategy::Iterative);
        let retry_error = match self
            .run_iterative(task, &mut session, self.params.max_steps)
            .await
        {
            Ok(attempt) => {
                return self.outcome(
                    attempt,
                    strategy,
                    FallbackStage::Iterative,
                    &session,
                    Some(primary_error.to_string()),
                );
            }
            Err(e) => e,
        };

        if session.lifetime_steps() == 0 {
            warn!("Iterative retry failed without taking a step: {}", retry_error);
            return self.failed(strategy, &session, primary_error, retry_error.to_string());
        }

        warn!("Iterative retry failed: {}; asking directly", retry_error);
        self.event_log.log(OrchestrationEvent::new(
            "strategy_fallback",
            serde_json::json!({
                "from": Strategy::Iterative.as_str(),
                "to": "direct_query",
                "error": retry_error.to_string(),
            }),
        ));

        let prompt = ReasoningPromptTemplate::direct(task, &session.transcript());
        let request = ModelRequest::new(prompt).with_tier(self.params.direct_tier);
        match self.ask(&mut session, request).await {
            Ok(reply) => self.outcome(
                Attempt::answered(reply.content),
                strategy,
                FallbackStage::DirectQuery,
                &session,
                Some(primary_error.to_string()),
            ),
            Err(e) => self.failed(strategy, &session, primary_error, e.to_string()),
        }
    }

    async fn run_strategy(
        &self,
        task: &Task,
        session: &mut ReasoningSession,
        strategy: Strategy,
    ) -> Result<Attempt, ReasoningError> {
        match strategy {
            Strategy::Iterative => self.run_iterative(task, session, self.params.max_steps).await,
            Strategy::PlanFirst => self.run_plan_first(task, session).await,
            Strategy::BatchReasoning => self.run_batch(task, session).await,
            Strategy::SelfCritique => self.run_self_critique(task, session).await,
        }
    }

    // ==================== Shared Helpers ====================

    /// Ask the model and account the reply's cost to the session.
    async fn ask(
        &self,
        session: &mut ReasoningSession,
        request: ModelRequest,
    ) -> Result<ModelReply, ReasoningError> {
        let reply = self.model.ask(request).await?;
        debug!("{} replied ({} chars, ${:.4})", reply.model, reply.content.len(), reply.cost);
        session.add_cost(reply.cost);
        Ok(reply)
    }

    fn request(&self, prompt: String, tier: Tier) -> ModelRequest {
        ModelRequest::new(prompt)
            .with_system(ReasoningPromptTemplate::system(&self.toolbox.capabilities()))
            .with_tier(tier)
    }

    /// Safety-gate an action, then dispatch it.
    async fn dispatch(&self, action: &Action) -> Observation {
        match self.safety.check_action(action) {
            SafetyVerdict::Allowed => self.toolbox.dispatch(action).await,
            SafetyVerdict::Blocked(reason) => {
                warn!("Blocked {}: {}", action.tool_name(), reason);
                self.event_log.log(OrchestrationEvent::new(
                    "action_blocked",
                    serde_json::json!({
                        "tool": action.tool_name(),
                        "argument": truncate(&action.argument(), 200),
                        "reason": reason,
                    }),
                ));
                Observation::blocked(reason)
            }
        }
    }

    /// Parse an action line and dispatch it; parse errors become observations.
    async fn run_action_line(&self, line: &str) -> LineResult {
        match Action::parse(line) {
            Ok(Action::Finish { answer }) => LineResult::Finished(answer),
            Ok(action) => LineResult::Observed(self.dispatch(&action).await),
            Err(e) => LineResult::Observed(Observation::error(e.to_string())),
        }
    }

    /// Check the step, time and budget limits before another step.
    ///
    /// `Ok(Some(_))` is a budget soft stop carrying a best-effort answer.
    fn check_limits(
        &self,
        task: &Task,
        session: &ReasoningSession,
        max_steps: usize,
    ) -> Result<Option<Attempt>, ReasoningError> {
        if session.step_count() >= max_steps {
            return Err(ReasoningError::StepLimit(max_steps));
        }
        let elapsed = session.elapsed();
        if elapsed >= self.params.max_duration {
            return Err(ReasoningError::Timeout {
                elapsed,
                last: session
                    .last_observation()
                    .map(|o| truncate(&o.text, 200))
                    .unwrap_or_else(|| "(none)".to_string()),
            });
        }
        if session.cost() >= task.budget() {
            info!(
                "Budget of ${:.2} exhausted after {} steps",
                task.budget(),
                session.step_count()
            );
            let last = session
                .last_observation()
                .map(|o| o.text.clone())
                .unwrap_or_default();
            return Ok(Some(Attempt::partial(format!(
                "Budget exhausted before the task finished. Last observation: {}",
                truncate(&last, 500)
            ))));
        }
        Ok(None)
    }

    fn outcome(
        &self,
        attempt: Attempt,
        strategy: Strategy,
        stage: FallbackStage,
        session: &ReasoningSession,
        error: Option<String>,
    ) -> ReasoningOutcome {
        info!(
            "Reasoning finished via {:?} after {} steps (${:.4})",
            stage,
            session.lifetime_steps(),
            session.cost()
        );
        ReasoningOutcome {
            answer: attempt.answer,
            success: attempt.complete,
            strategy,
            stage,
            steps: session.steps().to_vec(),
            total_steps: session.lifetime_steps(),
            cost: session.cost(),
            error,
        }
    }

    fn failed(
        &self,
        strategy: Strategy,
        session: &ReasoningSession,
        primary: ReasoningError,
        last: String,
    ) -> ReasoningOutcome {
        ReasoningOutcome {
            answer: String::new(),
            success: false,
            strategy,
            stage: FallbackStage::DirectQuery,
            steps: session.steps().to_vec(),
            total_steps: session.lifetime_steps(),
            cost: session.cost(),
            error: Some(format!("{}; fallback: {}", primary, last)),
        }
    }
}

#[async_trait]
impl<M: ModelService + 'static> TaskRunner for ReasoningExecutor<M> {
    async fn run(&self, task: &Task) -> AgentResult {
        let outcome = self.execute(task, None).await;
        if outcome.success {
            AgentResult::success(outcome.answer, outcome.cost, outcome.total_steps)
        } else {
            let mut result = AgentResult::failure(
                outcome
                    .error
                    .unwrap_or_else(|| "no complete answer".to_string()),
                outcome.cost,
                outcome.total_steps,
            );
            result.output = outcome.answer;
            result
        }
    }
}
