//! Autonomy cycle: a heartbeat routine that works through failing jobs.
//!
//! Each iteration runs Observe → Question → Prioritize → Execute → Verify →
//! Score, and the loop stops when the convergence tracker says so or the
//! score stops improving by at least `min_delta`.

use super::{HeartbeatRoutine, RoutineError, RoutineReport};
use crate::config::AutonomyParams;
use crate::ports::decision::DecisionService;
use crate::ports::event_log::{EventLog, NoEventLog, OrchestrationEvent};
use crate::ports::job_queue::{JobQueue, JobQueueError};
use crate::ports::model_service::{ModelRequest, ModelService};
use async_trait::async_trait;
use chrono::Utc;
use conclave_domain::heartbeat::{build_candidates, heuristic_questions, select_heuristically};
use conclave_domain::{
    AutonomyPromptTemplate, CandidateActionSet, CandidateStrategy, ConvergenceTracker,
    JobDescriptor, MetricHistory, MetricSnapshot, SafetyPolicy, SafetyVerdict, StopReason,
    VerificationReport,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_QUESTIONS: usize = 5;

/// One pass through the six phases
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub strategy: CandidateStrategy,
    pub job_ids: Vec<String>,
    pub questions: Vec<String>,
    pub verification: VerificationReport,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutonomyReport {
    pub iterations: Vec<IterationRecord>,
    pub stop_reason: Option<StopReason>,
}

impl AutonomyReport {
    pub fn final_score(&self) -> Option<f64> {
        self.iterations.last().map(|i| i.score)
    }

    pub fn summary(&self) -> String {
        match (self.final_score(), self.stop_reason) {
            (None, _) => "nothing to do".to_string(),
            (Some(score), Some(reason)) => format!(
                "{} iteration(s), score {:.0}, stopped: {}",
                self.iterations.len(),
                score,
                reason
            ),
            (Some(score), None) => {
                format!("{} iteration(s), score {:.0}", self.iterations.len(), score)
            }
        }
    }
}

pub struct AutonomyCycle {
    queue: Arc<dyn JobQueue>,
    safety: SafetyPolicy,
    params: AutonomyParams,
    tracker: ConvergenceTracker,
    decision: Option<Arc<dyn DecisionService>>,
    question_model: Option<Arc<dyn ModelService>>,
    event_log: Arc<dyn EventLog>,
}

impl AutonomyCycle {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        safety: SafetyPolicy,
        params: AutonomyParams,
        tracker: ConvergenceTracker,
    ) -> Self {
        Self {
            queue,
            safety,
            params,
            tracker,
            decision: None,
            question_model: None,
            event_log: Arc::new(NoEventLog),
        }
    }

    pub fn with_decision_service(mut self, decision: Arc<dyn DecisionService>) -> Self {
        self.decision = Some(decision);
        self
    }

    /// Model used for adversarial questions when `model_questions` is set.
    pub fn with_question_model(mut self, model: Arc<dyn ModelService>) -> Self {
        self.question_model = Some(model);
        self
    }

    pub fn with_event_log(mut self, event_log: Arc<dyn EventLog>) -> Self {
        self.event_log = event_log;
        self
    }

    pub async fn run_cycle(&self) -> Result<AutonomyReport, JobQueueError> {
        let mut history = MetricHistory::new(self.params.history_len);
        let mut report = AutonomyReport::default();

        for iteration in 0..self.params.max_iterations {
            // Observe
            let tick = self.queue.tick().await?;
            if !tick.runs.is_empty() {
                debug!("Tick ran {} due jobs ({} failed)", tick.runs.len(), tick.failures());
            }
            let jobs = self.queue.pending().await?;

            // Prioritize needs candidates; no enabled jobs means nothing to do
            let candidates = build_candidates(&jobs);
            if candidates.is_empty() {
                info!("No enabled jobs; autonomy cycle idle");
                break;
            }

            // Question
            let questions = self.questions(&jobs).await;

            // Prioritize
            let Some(chosen) = self.choose(&candidates, &questions).await else {
                break;
            };
            let candidate = &candidates[chosen];
            info!(
                "Iteration {}: running {} ({} jobs, risk {:.2})",
                iteration + 1,
                candidate.strategy,
                candidate.job_ids.len(),
                candidate.risk
            );

            // Execute
            let mut verification = self.execute(candidate).await;

            // Verify
            let after = self.queue.pending().await?;
            verification.remaining_failures = after
                .iter()
                .filter(|j| j.enabled && j.failures > 0)
                .count();

            // Score
            let score = verification.score();
            let previous = history.latest().map(|s| s.score);
            history.push(
                MetricSnapshot::new(iteration, score)
                    .with_violations(verification.remaining_failures as u64)
                    .with_metric("succeeded", verification.succeeded as f64)
                    .with_metric("blocked", verification.blocked as f64),
            );
            self.event_log.log(OrchestrationEvent::new(
                "autonomy_iteration",
                serde_json::json!({
                    "iteration": iteration + 1,
                    "strategy": candidate.strategy.as_str(),
                    "jobs": candidate.job_ids,
                    "executed": verification.executed,
                    "succeeded": verification.succeeded,
                    "blocked": verification.blocked,
                    "remaining_failures": verification.remaining_failures,
                    "score": score,
                }),
            ));
            report.iterations.push(IterationRecord {
                strategy: candidate.strategy,
                job_ids: candidate.job_ids.clone(),
                questions,
                verification,
                score,
            });

            if let Some(reason) = self.tracker.stop_reason(&history) {
                info!("Autonomy cycle stopping: {}", reason);
                report.stop_reason = Some(reason);
                break;
            }
            if let Some(prev) = previous
                && score - prev < self.params.min_delta
            {
                info!(
                    "Score moved {:.1} -> {:.1}, below the minimum improvement",
                    prev, score
                );
                report.stop_reason = Some(StopReason::Plateau);
                break;
            }
        }

        Ok(report)
    }

    async fn questions(&self, jobs: &[JobDescriptor]) -> Vec<String> {
        if self.params.model_questions
            && let Some(model) = &self.question_model
        {
            let request = ModelRequest::new(AutonomyPromptTemplate::questions(jobs))
                .with_tier(self.params.question_tier);
            match model.ask(request).await {
                Ok(reply) => {
                    let questions = parse_questions(&reply.content);
                    if !questions.is_empty() {
                        return questions;
                    }
                    debug!("Model asked no questions; using heuristics");
                }
                Err(e) => warn!("Question generation failed: {}; using heuristics", e),
            }
        }
        heuristic_questions(jobs, Utc::now())
    }

    async fn choose(&self, candidates: &[CandidateActionSet], questions: &[String]) -> Option<usize> {
        if let Some(decision) = &self.decision {
            match decision.choose(candidates, questions).await {
                Some(i) if i < candidates.len() => return Some(i),
                Some(i) => warn!("Decision picked candidate {} of {}; using heuristics", i, candidates.len()),
                None => debug!("Decision service abstained; using heuristics"),
            }
        }
        select_heuristically(candidates)
    }

    async fn execute(&self, candidate: &CandidateActionSet) -> VerificationReport {
        let mut verification = VerificationReport::default();
        for (job_id, command) in candidate.job_ids.iter().zip(&candidate.commands) {
            if let SafetyVerdict::Blocked(reason) = self.safety.check_command(command) {
                warn!("Job '{}' blocked: {}", job_id, reason);
                verification.blocked += 1;
                continue;
            }
            verification.executed += 1;
            match self.queue.run_job(job_id).await {
                Ok(run) if run.success => verification.succeeded += 1,
                Ok(run) => debug!("Job '{}' failed: {}", job_id, run.output),
                Err(e) => warn!("Job '{}' could not run: {}", job_id, e),
            }
        }
        verification
    }
}

/// Question lines from a model reply, list markers stripped.
fn parse_questions(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '-' | '*' | '.' | ')'))
                .trim()
        })
        .filter(|line| !line.is_empty())
        .take(MAX_QUESTIONS)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl HeartbeatRoutine for AutonomyCycle {
    async fn run(&self) -> Result<RoutineReport, RoutineError> {
        let report = self.run_cycle().await?;
        Ok(RoutineReport {
            summary: report.summary(),
            score: report.final_score(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::job_queue::{JobRun, TickReport};
    use crate::use_cases::scripted::{ScriptedModel, text};
    use std::sync::Mutex;

    /// Queue whose jobs succeed unless listed as broken.
    struct FakeQueue {
        jobs: Mutex<Vec<JobDescriptor>>,
        broken: Vec<String>,
        runs: Mutex<Vec<String>>,
    }

    impl FakeQueue {
        fn new(jobs: Vec<JobDescriptor>) -> Self {
            Self {
                jobs: Mutex::new(jobs),
                broken: Vec::new(),
                runs: Mutex::new(Vec::new()),
            }
        }

        fn with_broken(mut self, id: &str) -> Self {
            self.broken.push(id.to_string());
            self
        }

        fn runs(&self) -> Vec<String> {
            self.runs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobQueue for FakeQueue {
        async fn pending(&self) -> Result<Vec<JobDescriptor>, JobQueueError> {
            Ok(self.jobs.lock().unwrap().clone())
        }

        async fn tick(&self) -> Result<TickReport, JobQueueError> {
            Ok(TickReport::default())
        }

        async fn run_job(&self, id: &str) -> Result<JobRun, JobQueueError> {
            self.runs.lock().unwrap().push(id.to_string());
            let success = !self.broken.iter().any(|b| b == id);
            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs
                .iter_mut()
                .find(|j| j.id == id)
                .ok_or_else(|| JobQueueError::UnknownJob(id.to_string()))?;
            job.failures = if success { 0 } else { job.failures + 1 };
            Ok(JobRun {
                id: id.to_string(),
                success,
                output: String::new(),
            })
        }
    }

    /// Decision service returning a fixed index and recording the questions.
    struct FixedDecision {
        choice: Option<usize>,
        questions: Mutex<Vec<String>>,
    }

    impl FixedDecision {
        fn new(choice: Option<usize>) -> Self {
            Self {
                choice,
                questions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DecisionService for FixedDecision {
        async fn choose(&self, _: &[CandidateActionSet], questions: &[String]) -> Option<usize> {
            *self.questions.lock().unwrap() = questions.to_vec();
            self.choice
        }
    }

    fn cycle(queue: Arc<FakeQueue>, params: AutonomyParams) -> AutonomyCycle {
        AutonomyCycle::new(
            queue,
            SafetyPolicy::new("/work"),
            params,
            ConvergenceTracker::default(),
        )
    }

    #[tokio::test]
    async fn test_fixing_failures_converges() {
        let queue = Arc::new(FakeQueue::new(vec![
            JobDescriptor::new("a", "make fix").with_failures(2),
            JobDescriptor::new("b", "make docs"),
        ]));
        let cycle = cycle(queue.clone(), AutonomyParams::default())
            .with_decision_service(Arc::new(FixedDecision::new(Some(0))));

        let report = cycle.run_cycle().await.unwrap();

        assert_eq!(report.iterations.len(), 1);
        assert_eq!(report.iterations[0].strategy, CandidateStrategy::FailureFirst);
        assert_eq!(report.stop_reason, Some(StopReason::Converged));
        assert_eq!(report.final_score(), Some(100.0));
        assert_eq!(queue.runs(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_blocked_commands_are_not_run() {
        let queue = Arc::new(FakeQueue::new(vec![
            JobDescriptor::new("wipe", "rm -rf /").with_failures(1),
        ]));
        let cycle = cycle(queue.clone(), AutonomyParams::default())
            .with_decision_service(Arc::new(FixedDecision::new(Some(0))));

        let report = cycle.run_cycle().await.unwrap();

        assert!(queue.runs().is_empty());
        assert_eq!(report.iterations[0].verification.blocked, 1);
        assert_eq!(report.iterations[0].score, 90.0);
        // the second identical score is no improvement
        assert_eq!(report.iterations.len(), 2);
        assert_eq!(report.stop_reason, Some(StopReason::Plateau));
    }

    #[tokio::test]
    async fn test_out_of_range_decision_falls_back_to_heuristic() {
        let queue = Arc::new(
            FakeQueue::new(vec![
                JobDescriptor::new("a", "make a").with_failures(3),
                JobDescriptor::new("b", "make b").with_priority(5),
            ])
            .with_broken("a"),
        );
        let cycle = cycle(queue.clone(), AutonomyParams::default().with_max_iterations(1))
            .with_decision_service(Arc::new(FixedDecision::new(Some(99))));

        let report = cycle.run_cycle().await.unwrap();

        // lowest-risk candidate is priority-first: b, then a
        assert_eq!(report.iterations[0].strategy, CandidateStrategy::PriorityFirst);
        assert_eq!(queue.runs(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(report.iterations[0].verification.remaining_failures, 1);
    }

    #[tokio::test]
    async fn test_model_questions_reach_the_decision() {
        let queue = Arc::new(FakeQueue::new(vec![
            JobDescriptor::new("a", "make a").with_failures(1),
        ]));
        let decision = Arc::new(FixedDecision::new(None));
        let model = Arc::new(ScriptedModel::new(vec![text(
            "1. Why does a keep failing?\n2. What if it hangs?",
        )]));
        let cycle = cycle(
            queue,
            AutonomyParams::default()
                .with_model_questions(true)
                .with_max_iterations(1),
        )
        .with_decision_service(decision.clone())
        .with_question_model(model);

        cycle.run_cycle().await.unwrap();

        assert_eq!(
            *decision.questions.lock().unwrap(),
            vec!["Why does a keep failing?".to_string(), "What if it hangs?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_idle_without_enabled_jobs() {
        let queue = Arc::new(FakeQueue::new(vec![JobDescriptor::new("a", "x").disabled()]));
        let cycle = cycle(queue, AutonomyParams::default());

        let report = cycle.run_cycle().await.unwrap();

        assert!(report.iterations.is_empty());
        assert_eq!(report.summary(), "nothing to do");
    }

    #[tokio::test]
    async fn test_routine_reports_score() {
        let queue = Arc::new(FakeQueue::new(vec![
            JobDescriptor::new("a", "make a").with_failures(1),
        ]));
        let cycle = cycle(queue, AutonomyParams::default());

        let routine = cycle.run().await.unwrap();

        assert_eq!(routine.score, Some(100.0));
        assert!(routine.summary.contains("converged"));
    }
}
