//! Decision algorithms of the autonomy cycle.
//!
//! Observe → Question → Prioritize → Execute → Verify → Score. The pure parts
//! live here: heuristic questions, candidate construction, risk-scored
//! selection and quality scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Jobs taken per candidate action set.
pub const CANDIDATE_SIZE: usize = 3;

/// Pending job as exposed by the job queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: String,
    pub command: String,
    pub priority: i32,
    pub next_at: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub failures: u32,
}

impl JobDescriptor {
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            priority: 0,
            next_at: None,
            enabled: true,
            failures: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_failures(mut self, failures: u32) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_next_at(mut self, next_at: DateTime<Utc>) -> Self {
        self.next_at = Some(next_at);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_at.is_none_or(|at| at <= now)
    }
}

/// Adversarial questions about the pending work, generated without a model.
pub fn heuristic_questions(jobs: &[JobDescriptor], now: DateTime<Utc>) -> Vec<String> {
    let mut questions = Vec::new();
    for job in jobs {
        if job.failures > 0 {
            questions.push(format!(
                "Job '{}' has failed {} time(s) in a row. Is the command itself wrong, or an input it depends on?",
                job.id, job.failures
            ));
        }
        if !job.enabled {
            questions.push(format!(
                "Job '{}' is disabled. Is it still needed, or is it hiding a problem?",
                job.id
            ));
        } else if job.next_at.is_some_and(|at| at < now) {
            questions.push(format!(
                "Job '{}' is overdue. What breaks if it runs late again?",
                job.id
            ));
        }
    }
    if questions.is_empty() && !jobs.is_empty() {
        questions.push(
            "Nothing is failing. Which pending job would do the most damage if it silently misbehaved?"
                .to_string(),
        );
    }
    questions.truncate(5);
    questions
}

/// Ordering used to build a candidate action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStrategy {
    /// Most-failing jobs first.
    FailureFirst,
    /// Highest priority first.
    PriorityFirst,
    /// Healthiest jobs first.
    ConfidenceFirst,
}

impl CandidateStrategy {
    pub const ALL: [CandidateStrategy; 3] = [
        CandidateStrategy::FailureFirst,
        CandidateStrategy::PriorityFirst,
        CandidateStrategy::ConfidenceFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStrategy::FailureFirst => "failure_first",
            CandidateStrategy::PriorityFirst => "priority_first",
            CandidateStrategy::ConfidenceFirst => "confidence_first",
        }
    }
}

impl std::fmt::Display for CandidateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prioritized set of commands with its scores, all in `[0, 1]` except
/// `cost` (number of commands).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateActionSet {
    pub strategy: CandidateStrategy,
    pub job_ids: Vec<String>,
    pub commands: Vec<String>,
    pub risk: f64,
    pub impact: f64,
    pub confidence: f64,
    pub cost: f64,
}

/// Build one candidate per strategy from the enabled jobs.
///
/// Strategies with no jobs to offer produce no candidate. Sorting is
/// stable, so ties keep queue order.
pub fn build_candidates(jobs: &[JobDescriptor]) -> Vec<CandidateActionSet> {
    let enabled: Vec<&JobDescriptor> = jobs.iter().filter(|j| j.enabled).collect();
    if enabled.is_empty() {
        return Vec::new();
    }

    CandidateStrategy::ALL
        .iter()
        .filter_map(|strategy| {
            let mut ordered = enabled.clone();
            match strategy {
                CandidateStrategy::FailureFirst => {
                    ordered.retain(|j| j.failures > 0);
                    ordered.sort_by(|a, b| b.failures.cmp(&a.failures));
                }
                CandidateStrategy::PriorityFirst => {
                    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
                }
                CandidateStrategy::ConfidenceFirst => {
                    ordered.sort_by(|a, b| {
                        a.failures
                            .cmp(&b.failures)
                            .then_with(|| b.priority.cmp(&a.priority))
                    });
                }
            }
            ordered.truncate(CANDIDATE_SIZE);
            (!ordered.is_empty()).then(|| score_candidate(*strategy, &ordered))
        })
        .collect()
}

fn score_candidate(strategy: CandidateStrategy, jobs: &[&JobDescriptor]) -> CandidateActionSet {
    let n = jobs.len() as f64;
    let risk = mean_of(jobs, |j| (0.2 + 0.15 * j.failures as f64).min(1.0));
    let confidence = mean_of(jobs, |j| 1.0 / (1.0 + j.failures as f64));
    let mut impact = mean_of(jobs, |j| (j.priority.clamp(0, 10) as f64) / 10.0);
    if strategy == CandidateStrategy::FailureFirst {
        impact = (impact + 0.3).min(1.0);
    }

    CandidateActionSet {
        strategy,
        job_ids: jobs.iter().map(|j| j.id.clone()).collect(),
        commands: jobs.iter().map(|j| j.command.clone()).collect(),
        risk,
        impact,
        confidence,
        cost: n,
    }
}

fn mean_of(jobs: &[&JobDescriptor], f: impl Fn(&JobDescriptor) -> f64) -> f64 {
    jobs.iter().map(|j| f(j)).sum::<f64>() / jobs.len().max(1) as f64
}

/// Deterministic choice: minimum risk, ties broken by the highest
/// `impact × confidence`, then by position.
pub fn select_heuristically(candidates: &[CandidateActionSet]) -> Option<usize> {
    const EPS: f64 = 1e-9;
    let mut best: Option<usize> = None;
    for (i, c) in candidates.iter().enumerate() {
        let Some(b) = best else {
            best = Some(i);
            continue;
        };
        let current = &candidates[b];
        let lower_risk = c.risk < current.risk - EPS;
        let same_risk = (c.risk - current.risk).abs() <= EPS;
        let better_value = c.impact * c.confidence > current.impact * current.confidence + EPS;
        if lower_risk || (same_risk && better_value) {
            best = Some(i);
        }
    }
    best
}

/// Outcome of executing and verifying one candidate set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub executed: usize,
    pub succeeded: usize,
    pub blocked: usize,
    /// Enabled jobs still failing after the tick.
    pub remaining_failures: usize,
}

impl VerificationReport {
    /// Quality score in `[0, 100]`: the command success rate, minus a
    /// penalty per job still failing.
    pub fn score(&self) -> f64 {
        let rate = if self.executed == 0 {
            1.0
        } else {
            self.succeeded as f64 / self.executed as f64
        };
        (rate * 100.0 - 10.0 * self.remaining_failures as f64).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jobs() -> Vec<JobDescriptor> {
        vec![
            JobDescriptor::new("backup", "tar czf b.tgz data").with_priority(5),
            JobDescriptor::new("sync", "rsync -a src dst")
                .with_priority(9)
                .with_failures(3),
            JobDescriptor::new("lint", "cargo clippy").with_priority(2),
            JobDescriptor::new("old", "echo old").disabled(),
        ]
    }

    #[test]
    fn test_heuristic_questions() {
        let now = Utc::now();
        let mut list = jobs();
        list[0].next_at = Some(now - Duration::minutes(5));
        let questions = heuristic_questions(&list, now);
        assert!(questions.iter().any(|q| q.contains("'sync' has failed 3")));
        assert!(questions.iter().any(|q| q.contains("'old' is disabled")));
        assert!(questions.iter().any(|q| q.contains("'backup' is overdue")));
        assert!(heuristic_questions(&[], now).is_empty());
    }

    #[test]
    fn test_build_candidates() {
        let candidates = build_candidates(&jobs());
        assert_eq!(candidates.len(), 3);

        let failure_first = &candidates[0];
        assert_eq!(failure_first.strategy, CandidateStrategy::FailureFirst);
        assert_eq!(failure_first.job_ids, vec!["sync"]);

        let priority_first = &candidates[1];
        assert_eq!(priority_first.job_ids, vec!["sync", "backup", "lint"]);

        let confidence_first = &candidates[2];
        assert_eq!(confidence_first.job_ids, vec!["backup", "lint", "sync"]);
        assert!(candidates.iter().all(|c| !c.job_ids.contains(&"old".to_string())));
    }

    #[test]
    fn test_no_failures_no_failure_first() {
        let list = vec![JobDescriptor::new("a", "true")];
        let candidates = build_candidates(&list);
        assert_eq!(candidates.len(), 2);
        assert!(
            candidates
                .iter()
                .all(|c| c.strategy != CandidateStrategy::FailureFirst)
        );
    }

    #[test]
    fn test_select_min_risk() {
        let candidates = build_candidates(&jobs());
        // failure-first holds only the failing job, so it is the riskiest;
        // priority-first and confidence-first share the same jobs and risk
        let chosen = select_heuristically(&candidates).unwrap();
        assert_ne!(candidates[chosen].strategy, CandidateStrategy::FailureFirst);
        assert_eq!(select_heuristically(&[]), None);
    }

    #[test]
    fn test_select_tie_breaks_on_value() {
        let base = CandidateActionSet {
            strategy: CandidateStrategy::PriorityFirst,
            job_ids: vec![],
            commands: vec![],
            risk: 0.2,
            impact: 0.5,
            confidence: 0.5,
            cost: 1.0,
        };
        let better = CandidateActionSet {
            strategy: CandidateStrategy::ConfidenceFirst,
            impact: 0.9,
            ..base.clone()
        };
        assert_eq!(select_heuristically(&[base.clone(), better]), Some(1));

        let riskier = CandidateActionSet {
            risk: 0.5,
            impact: 1.0,
            confidence: 1.0,
            ..base.clone()
        };
        assert_eq!(select_heuristically(&[riskier, base]), Some(1));
    }

    #[test]
    fn test_verification_score() {
        let report = VerificationReport {
            executed: 4,
            succeeded: 3,
            blocked: 0,
            remaining_failures: 1,
        };
        assert_eq!(report.score(), 65.0);
        assert_eq!(VerificationReport::default().score(), 100.0);
    }
}
