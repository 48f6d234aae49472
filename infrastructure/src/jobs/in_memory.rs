//! In-memory job queue over the configured `[[jobs]]`.
//!
//! Jobs are re-run every `every_secs`. A run updates the job's failure
//! streak (reset on success) and schedules the next run from now.
//!
//! With a [`SafetyPolicy`] attached, commands matching the deny-list are
//! never handed to the runner; the run is recorded as a failure instead.

use crate::config::FileJobConfig;
use crate::tools::command::run_shell;
use async_trait::async_trait;
use chrono::Utc;
use conclave_application::{JobQueue, JobQueueError, JobRun, TickReport};
use conclave_domain::{JobDescriptor, SafetyPolicy, SafetyVerdict};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Executes a job's command line.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Returns whether the command succeeded and its output.
    async fn run(&self, command: &str) -> (bool, String);
}

/// Runs job commands through `sh -c` in a working directory.
pub struct ShellJobRunner {
    working_dir: PathBuf,
    timeout: Duration,
    max_output: usize,
}

impl ShellJobRunner {
    pub fn new(working_dir: impl Into<PathBuf>, timeout: Duration, max_output: usize) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout,
            max_output,
        }
    }
}

#[async_trait]
impl JobRunner for ShellJobRunner {
    async fn run(&self, command: &str) -> (bool, String) {
        let obs = run_shell(&self.working_dir, command, self.timeout, self.max_output).await;
        (!obs.is_failure(), obs.text)
    }
}

struct ScheduledJob {
    descriptor: JobDescriptor,
    every: chrono::Duration,
}

pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<ScheduledJob>>,
    runner: Arc<dyn JobRunner>,
    safety: Option<SafetyPolicy>,
}

impl InMemoryJobQueue {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            runner,
            safety: None,
        }
    }

    /// Refuse to run commands the policy blocks.
    pub fn with_safety(mut self, safety: SafetyPolicy) -> Self {
        self.safety = Some(safety);
        self
    }

    pub fn from_config(jobs: &[FileJobConfig], runner: Arc<dyn JobRunner>) -> Self {
        let queue = Self::new(runner);
        for job in jobs {
            let mut descriptor =
                JobDescriptor::new(&job.id, &job.command).with_priority(job.priority);
            if !job.enabled {
                descriptor = descriptor.disabled();
            }
            queue.add(descriptor, Duration::from_secs(job.every_secs));
        }
        queue
    }

    /// Add or replace a job. It is due immediately unless `next_at` is set.
    pub fn add(&self, descriptor: JobDescriptor, every: Duration) {
        let every = chrono::Duration::from_std(every).unwrap_or(chrono::Duration::MAX);
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.retain(|j| j.descriptor.id != descriptor.id);
        jobs.push(ScheduledJob { descriptor, every });
    }

    fn command_of(&self, id: &str) -> Result<String, JobQueueError> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.iter()
            .find(|j| j.descriptor.id == id)
            .map(|j| j.descriptor.command.clone())
            .ok_or_else(|| JobQueueError::UnknownJob(id.to_string()))
    }

    fn record(&self, id: &str, success: bool) {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(job) = jobs.iter_mut().find(|j| j.descriptor.id == id) {
            job.descriptor.failures = if success { 0 } else { job.descriptor.failures + 1 };
            job.descriptor.next_at = Some(now.checked_add_signed(job.every).unwrap_or(now));
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn pending(&self) -> Result<Vec<JobDescriptor>, JobQueueError> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(jobs.iter().map(|j| j.descriptor.clone()).collect())
    }

    async fn tick(&self) -> Result<TickReport, JobQueueError> {
        let now = Utc::now();
        let due: Vec<String> = {
            let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            jobs.iter()
                .filter(|j| j.descriptor.is_due(now))
                .map(|j| j.descriptor.id.clone())
                .collect()
        };
        debug!(due = due.len(), "Job queue tick");

        let mut report = TickReport::default();
        for id in due {
            report.runs.push(self.run_job(&id).await?);
        }
        if report.failures() > 0 {
            warn!(failures = report.failures(), "Scheduled jobs failed");
        }
        Ok(report)
    }

    async fn run_job(&self, id: &str) -> Result<JobRun, JobQueueError> {
        let command = self.command_of(id)?;
        if let Some(SafetyVerdict::Blocked(reason)) =
            self.safety.as_ref().map(|s| s.check_command(&command))
        {
            warn!(job = id, "Job blocked: {}", reason);
            self.record(id, false);
            return Ok(JobRun {
                id: id.to_string(),
                success: false,
                output: format!("blocked: {}", reason),
            });
        }
        let (success, output) = self.runner.run(&command).await;
        self.record(id, success);
        info!(job = id, success, "Job finished");
        Ok(JobRun {
            id: id.to_string(),
            success,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_application::{AutonomyCycle, AutonomyParams};
    use conclave_domain::ConvergenceTracker;

    /// Succeeds unless the command contains "fail".
    struct FakeRunner {
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl JobRunner for FakeRunner {
        async fn run(&self, command: &str) -> (bool, String) {
            self.calls.lock().unwrap().push(command.to_string());
            (!command.contains("fail"), format!("ran {}", command))
        }
    }

    fn job(id: &str, command: &str, enabled: bool) -> FileJobConfig {
        FileJobConfig {
            id: id.to_string(),
            command: command.to_string(),
            priority: 0,
            every_secs: 600,
            enabled,
        }
    }

    #[tokio::test]
    async fn test_tick_runs_due_enabled_jobs_and_reschedules() {
        let runner = FakeRunner::new();
        let queue = InMemoryJobQueue::from_config(
            &[
                job("lint", "cargo clippy", true),
                job("flaky", "fail now", true),
                job("off", "never", false),
            ],
            runner.clone(),
        );

        let report = queue.tick().await.unwrap();
        assert_eq!(report.runs.len(), 2);
        assert_eq!(report.failures(), 1);

        let pending = queue.pending().await.unwrap();
        let flaky = pending.iter().find(|j| j.id == "flaky").unwrap();
        assert_eq!(flaky.failures, 1);
        assert!(flaky.next_at.unwrap() > Utc::now());

        // Nothing is due again within the period
        let report = queue.tick().await.unwrap();
        assert!(report.runs.is_empty());
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_job_updates_failure_streak() {
        let queue = InMemoryJobQueue::new(FakeRunner::new());
        queue.add(JobDescriptor::new("j", "fail"), Duration::from_secs(60));

        queue.run_job("j").await.unwrap();
        queue.run_job("j").await.unwrap();
        assert_eq!(queue.pending().await.unwrap()[0].failures, 2);

        queue.add(JobDescriptor::new("j", "ok").with_failures(2), Duration::from_secs(60));
        let run = queue.run_job("j").await.unwrap();
        assert!(run.success);
        assert_eq!(run.output, "ran ok");
        assert_eq!(queue.pending().await.unwrap()[0].failures, 0);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let queue = InMemoryJobQueue::new(FakeRunner::new());
        assert_eq!(
            queue.run_job("ghost").await.unwrap_err(),
            JobQueueError::UnknownJob("ghost".to_string())
        );
    }

    #[tokio::test]
    async fn test_denied_command_never_reaches_runner() {
        let runner = FakeRunner::new();
        let queue = InMemoryJobQueue::from_config(
            &[job("wipe", "rm -rf /", true), job("lint", "cargo clippy", true)],
            runner.clone(),
        )
        .with_safety(SafetyPolicy::new("/work"));

        let report = queue.tick().await.unwrap();
        let wipe = report.runs.iter().find(|r| r.id == "wipe").unwrap();
        assert!(!wipe.success);
        assert!(wipe.output.starts_with("blocked"));
        assert_eq!(*runner.calls.lock().unwrap(), vec!["cargo clippy"]);
        let pending = queue.pending().await.unwrap();
        assert_eq!(pending.iter().find(|j| j.id == "wipe").unwrap().failures, 1);
    }

    #[tokio::test]
    async fn test_autonomy_cycle_over_queue_never_runs_denied_commands() {
        let runner = FakeRunner::new();
        let safety = SafetyPolicy::new("/work");
        let queue = InMemoryJobQueue::from_config(&[job("wipe", "rm -rf /", true)], runner.clone())
            .with_safety(safety.clone());
        let cycle = AutonomyCycle::new(
            Arc::new(queue),
            safety,
            AutonomyParams::default(),
            ConvergenceTracker::default(),
        );

        let report = cycle.run_cycle().await.unwrap();
        assert!(runner.calls.lock().unwrap().is_empty());
        let blocked: usize = report.iterations.iter().map(|i| i.verification.blocked).sum();
        let executed: usize = report.iterations.iter().map(|i| i.verification.executed).sum();
        assert!(blocked >= 1);
        assert_eq!(executed, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellJobRunner::new(dir.path(), Duration::from_secs(10), 1024);
        assert_eq!(runner.run("echo done").await, (true, "done".to_string()));
        assert!(!runner.run("exit 1").await.0);
    }
}
