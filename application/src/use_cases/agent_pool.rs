//! Agent pool use case
//!
//! Spawns budgeted agents in a flat registry and runs the pending ones in
//! bounded batches. Every agent ends in exactly one terminal state, even
//! when its runner times out or panics, and each termination updates the
//! per-scope reputation.

use crate::config::PoolParams;
use crate::ports::event_log::{EventLog, NoEventLog, OrchestrationEvent};
use async_trait::async_trait;
use conclave_domain::{Agent, AgentId, AgentReputation, AgentResult, AgentStatus, Task};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Runs one agent's task to a result
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: &Task) -> AgentResult;
}

/// Budget owner a new agent is carved from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRef {
    pub id: Option<AgentId>,
    pub budget: f64,
}

impl ParentRef {
    /// Top-level budget with no parent agent.
    pub fn root(budget: f64) -> Self {
        Self { id: None, budget }
    }

    pub fn agent(agent: &Agent) -> Self {
        Self {
            id: Some(agent.id.clone()),
            budget: agent.budget,
        }
    }
}

/// One agent's terminal state after a run
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRun {
    pub id: AgentId,
    pub status: AgentStatus,
    pub result: AgentResult,
}

/// Results of a `run_all` call, keyed by spawn index
#[derive(Debug, Clone, Default)]
pub struct PoolRunSummary {
    pub results: BTreeMap<usize, AgentRun>,
    pub batches: usize,
}

impl PoolRunSummary {
    pub fn succeeded(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.status == AgentStatus::Completed)
            .count()
    }
}

enum Termination {
    Finished(AgentResult),
    TimedOut,
}

pub struct AgentPool<R: TaskRunner + 'static> {
    runner: Arc<R>,
    params: PoolParams,
    agents: Mutex<Vec<Agent>>,
    reputation: Mutex<AgentReputation>,
    event_log: Arc<dyn EventLog>,
}

impl<R: TaskRunner + 'static> AgentPool<R> {
    pub fn new(runner: Arc<R>, params: PoolParams) -> Self {
        Self {
            runner,
            params,
            agents: Mutex::new(Vec::new()),
            reputation: Mutex::new(AgentReputation::new()),
            event_log: Arc::new(NoEventLog),
        }
    }

    pub fn with_event_log(mut self, event_log: Arc<dyn EventLog>) -> Self {
        self.event_log = event_log;
        self
    }

    fn lock_agents(&self) -> MutexGuard<'_, Vec<Agent>> {
        self.agents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a pending agent with `budget_fraction` of the parent's budget.
    ///
    /// The fraction is not clamped and sibling budgets are not reconciled
    /// against the parent.
    pub fn spawn(
        &self,
        task: Task,
        scope: &str,
        budget_fraction: f64,
        parent: &ParentRef,
    ) -> AgentId {
        let budget = parent.budget * budget_fraction;
        let task = task.with_scope(scope).with_budget(budget);
        let mut agents = self.lock_agents();
        let id = AgentId::sequential(agents.len());
        debug!("Spawned {} in scope '{}' with budget ${:.2}", id, scope, budget);
        agents.push(Agent::new(id.clone(), parent.id.clone(), task, scope, budget));
        id
    }

    /// Run every pending agent in batches of at most `max_concurrent`.
    pub async fn run_all(&self) -> PoolRunSummary {
        let pending: Vec<(usize, AgentId, Task)> = self
            .lock_agents()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.status == AgentStatus::Pending)
            .map(|(i, a)| (i, a.id.clone(), a.task.clone()))
            .collect();

        let mut summary = PoolRunSummary::default();
        if pending.is_empty() {
            return summary;
        }

        let batch_size = self.params.max_concurrent.max(1);
        let timeout = self.params.agent_timeout;
        info!(
            "Running {} agents, {} at a time",
            pending.len(),
            batch_size
        );

        for batch in pending.chunks(batch_size) {
            summary.batches += 1;
            debug!("Batch {}: {} agents", summary.batches, batch.len());
            {
                let mut agents = self.lock_agents();
                for (idx, _, _) in batch {
                    if let Err(e) = agents[*idx].start() {
                        warn!("Could not start agent: {}", e);
                    }
                }
            }

            let mut join_set = JoinSet::new();
            for (idx, _, task) in batch {
                let runner = Arc::clone(&self.runner);
                let task = task.clone();
                let idx = *idx;
                join_set.spawn(async move {
                    let run = AssertUnwindSafe(async move { runner.run(&task).await }).catch_unwind();
                    (idx, tokio::time::timeout(timeout, run).await)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((idx, Ok(Ok(result)))) => self.terminate(idx, Termination::Finished(result)),
                    Ok((idx, Ok(Err(_panic)))) => self.terminate(
                        idx,
                        Termination::Finished(AgentResult::failure("agent panicked", 0.0, 0)),
                    ),
                    Ok((idx, Err(_elapsed))) => self.terminate(idx, Termination::TimedOut),
                    Err(e) => warn!("Agent task aborted: {}", e),
                }
            }

            // agents whose join handle was lost still need a terminal state
            for (idx, _, _) in batch {
                let running = self.lock_agents()[*idx].status == AgentStatus::Running;
                if running {
                    self.terminate(
                        *idx,
                        Termination::Finished(AgentResult::failure("agent task aborted", 0.0, 0)),
                    );
                }
            }
        }

        let agents = self.lock_agents();
        for (idx, id, _) in &pending {
            if let Some(result) = agents[*idx].result.clone() {
                summary.results.insert(
                    *idx,
                    AgentRun {
                        id: id.clone(),
                        status: agents[*idx].status,
                        result,
                    },
                );
            }
        }
        info!(
            "Pool run finished: {}/{} succeeded in {} batches",
            summary.succeeded(),
            pending.len(),
            summary.batches
        );
        summary
    }

    fn terminate(&self, idx: usize, termination: Termination) {
        let (id, scope, status, cost) = {
            let mut agents = self.lock_agents();
            let agent = &mut agents[idx];
            let applied = match termination {
                Termination::Finished(result) => agent.finish(result),
                Termination::TimedOut => agent.time_out(self.params.agent_timeout),
            };
            if let Err(e) = applied {
                warn!("Ignoring late termination: {}", e);
                return;
            }
            (agent.id.clone(), agent.scope.clone(), agent.status, agent.cost())
        };

        if status == AgentStatus::Completed {
            debug!("{} completed (${:.4})", id, cost);
        } else {
            warn!("{} ended as {}", id, status);
        }
        self.reputation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&scope, status);
        self.event_log.log(OrchestrationEvent::new(
            "agent_terminated",
            serde_json::json!({
                "agent": id.as_str(),
                "scope": scope,
                "status": status.as_str(),
                "cost": cost,
            }),
        ));
    }

    // ==================== Queries ====================

    pub fn agents(&self) -> Vec<Agent> {
        self.lock_agents().clone()
    }

    pub fn get(&self, id: &AgentId) -> Option<Agent> {
        self.lock_agents().iter().find(|a| &a.id == id).cloned()
    }

    pub fn completed(&self) -> Vec<Agent> {
        self.with_status(|s| s == AgentStatus::Completed)
    }

    /// Agents that ended as `Failed` or `Timeout`.
    pub fn failed(&self) -> Vec<Agent> {
        self.with_status(|s| matches!(s, AgentStatus::Failed | AgentStatus::Timeout))
    }

    fn with_status(&self, keep: impl Fn(AgentStatus) -> bool) -> Vec<Agent> {
        self.lock_agents()
            .iter()
            .filter(|a| keep(a.status))
            .cloned()
            .collect()
    }

    /// Cost actually spent by finished agents.
    pub fn total_budget_used(&self) -> f64 {
        self.lock_agents().iter().map(Agent::cost).sum()
    }

    /// Budget carved out for every spawned agent.
    pub fn total_budget_allocated(&self) -> f64 {
        self.lock_agents().iter().map(|a| a.budget).sum()
    }

    pub fn reputation(&self) -> AgentReputation {
        self.reputation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
