//! Job queue port
//!
//! The heartbeat's autonomy cycle observes and drives scheduled jobs
//! through this interface.

use async_trait::async_trait;
use conclave_domain::JobDescriptor;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobQueueError {
    #[error("Job queue unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown job: {0}")]
    UnknownJob(String),
}

/// Result of running one job
#[derive(Debug, Clone, PartialEq)]
pub struct JobRun {
    pub id: String,
    pub success: bool,
    pub output: String,
}

/// Jobs executed by one scheduler tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub runs: Vec<JobRun>,
}

impl TickReport {
    pub fn failures(&self) -> usize {
        self.runs.iter().filter(|r| !r.success).count()
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Snapshot of every known job.
    async fn pending(&self) -> Result<Vec<JobDescriptor>, JobQueueError>;

    /// Run every job that is due now. Commands denied by the queue's
    /// safety policy are reported as failed runs without executing.
    async fn tick(&self) -> Result<TickReport, JobQueueError>;

    /// Run a single job immediately, updating its failure count.
    async fn run_job(&self, id: &str) -> Result<JobRun, JobQueueError>;
}
