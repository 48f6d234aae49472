//! Agent domain entities

use crate::core::error::DomainError;
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifier of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id derived from a spawn sequence number (`agent-7`).
    pub fn sequential(n: usize) -> Self {
        Self(format!("agent-{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an agent
///
/// `Pending → Running → {Completed, Failed, Timeout}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Pending => "pending",
            AgentStatus::Running => "running",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
            AgentStatus::Timeout => "timeout",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentStatus::Completed | AgentStatus::Failed | AgentStatus::Timeout
        )
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an agent run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    pub output: String,
    pub cost: f64,
    pub steps: usize,
    pub error: Option<String>,
}

impl AgentResult {
    pub fn success(output: impl Into<String>, cost: f64, steps: usize) -> Self {
        Self {
            success: true,
            output: output.into(),
            cost,
            steps,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, cost: f64, steps: usize) -> Self {
        Self {
            success: false,
            output: String::new(),
            cost,
            steps,
            error: Some(error.into()),
        }
    }

    /// Synthetic result for an agent cut off by the pool's timeout.
    pub fn timed_out(timeout: Duration) -> Self {
        Self::failure(format!("agent timed out after {:?}", timeout), 0.0, 0)
    }
}

/// A budgeted, time-limited execution of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub parent: Option<AgentId>,
    pub task: Task,
    pub scope: String,
    /// Budget ceiling carved from the parent's budget.
    pub budget: f64,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<AgentResult>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        parent: Option<AgentId>,
        task: Task,
        scope: impl Into<String>,
        budget: f64,
    ) -> Self {
        Self {
            id,
            parent,
            task,
            scope: scope.into(),
            budget,
            status: AgentStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
        }
    }

    pub fn start(&mut self) -> Result<(), DomainError> {
        if self.status != AgentStatus::Pending {
            return Err(self.transition_error(AgentStatus::Running));
        }
        self.status = AgentStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Record the run's result; `Completed` or `Failed` depending on success.
    pub fn finish(&mut self, result: AgentResult) -> Result<(), DomainError> {
        let next = if result.success {
            AgentStatus::Completed
        } else {
            AgentStatus::Failed
        };
        self.terminate(next, result)
    }

    pub fn time_out(&mut self, timeout: Duration) -> Result<(), DomainError> {
        self.terminate(AgentStatus::Timeout, AgentResult::timed_out(timeout))
    }

    fn terminate(&mut self, next: AgentStatus, result: AgentResult) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(self.transition_error(next));
        }
        self.status = next;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
        Ok(())
    }

    fn transition_error(&self, next: AgentStatus) -> DomainError {
        DomainError::InvalidState(format!("{}: {} -> {}", self.id, self.status, next))
    }

    /// Cost actually spent, zero until a result exists.
    pub fn cost(&self) -> f64 {
        self.result.as_ref().map(|r| r.cost).unwrap_or(0.0)
    }
}
