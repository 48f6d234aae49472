//! Per-scope agent reputation

use super::entities::AgentStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Append-only run counters for one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeReputation {
    pub total_runs: u64,
    pub successes: u64,
    pub timeouts: u64,
    pub rejections: u64,
}

impl ScopeReputation {
    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_runs as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReputation {
    scopes: BTreeMap<String, ScopeReputation>,
}

impl AgentReputation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a terminated run. Non-terminal statuses are ignored.
    pub fn record(&mut self, scope: &str, status: AgentStatus) {
        if !status.is_terminal() {
            return;
        }
        let entry = self.scopes.entry(scope.to_string()).or_default();
        entry.total_runs += 1;
        match status {
            AgentStatus::Completed => entry.successes += 1,
            AgentStatus::Timeout => entry.timeouts += 1,
            AgentStatus::Failed => entry.rejections += 1,
            AgentStatus::Pending | AgentStatus::Running => {}
        }
    }

    pub fn get(&self, scope: &str) -> ScopeReputation {
        self.scopes.get(scope).copied().unwrap_or_default()
    }

    pub fn scopes(&self) -> impl Iterator<Item = (&String, &ScopeReputation)> {
        self.scopes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let mut rep = AgentReputation::new();
        rep.record("code", AgentStatus::Completed);
        rep.record("code", AgentStatus::Timeout);
        rep.record("code", AgentStatus::Failed);
        rep.record("code", AgentStatus::Running);
        rep.record("docs", AgentStatus::Completed);

        let code = rep.get("code");
        assert_eq!(code.total_runs, 3);
        assert_eq!(code.successes, 1);
        assert_eq!(code.timeouts, 1);
        assert_eq!(code.rejections, 1);
        assert!((code.success_rate() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(rep.get("docs").success_rate(), 1.0);
        assert_eq!(rep.get("unknown").total_runs, 0);
    }
}
