//! Metric snapshots and the rolling history they are pushed onto.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Scalar metrics of one refinement iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub iteration: usize,
    /// Primary quality score; plateau and oscillation look at this.
    pub score: f64,
    /// Remaining violations; zero means the work is done.
    pub violations: Option<u64>,
    /// Additional tracked metrics, included in the delta.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    /// Text of the artifact at this iteration, for diff-oscillation checks.
    pub artifact: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MetricSnapshot {
    pub fn new(iteration: usize, score: f64) -> Self {
        Self {
            iteration,
            score,
            violations: None,
            metrics: BTreeMap::new(),
            artifact: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_violations(mut self, violations: u64) -> Self {
        self.violations = Some(violations);
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// All tracked values by name: `score`, `violations` (if set), extras.
    pub fn tracked(&self) -> BTreeMap<String, f64> {
        let mut values = self.metrics.clone();
        values.insert("score".to_string(), self.score);
        if let Some(v) = self.violations {
            values.insert("violations".to_string(), v as f64);
        }
        values
    }
}

/// Bounded rolling history with FIFO eviction.
#[derive(Debug, Clone)]
pub struct MetricHistory {
    snapshots: VecDeque<MetricSnapshot>,
    max_len: usize,
    total_pushed: usize,
}

impl MetricHistory {
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            snapshots: VecDeque::with_capacity(max_len),
            max_len,
            total_pushed: 0,
        }
    }

    pub fn push(&mut self, snapshot: MetricSnapshot) {
        if self.snapshots.len() == self.max_len {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
        self.total_pushed += 1;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Snapshots pushed over the history's lifetime, evicted ones included.
    pub fn total_pushed(&self) -> usize {
        self.total_pushed
    }

    pub fn latest(&self) -> Option<&MetricSnapshot> {
        self.snapshots.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSnapshot> {
        self.snapshots.iter()
    }

    /// The most recent `n` snapshots, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<&MetricSnapshot> {
        let skip = self.snapshots.len().saturating_sub(n);
        self.snapshots.iter().skip(skip).collect()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.score).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_eviction() {
        let mut history = MetricHistory::new(3);
        for i in 0..5 {
            history.push(MetricSnapshot::new(i, i as f64));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.total_pushed(), 5);
        assert_eq!(history.scores(), vec![2.0, 3.0, 4.0]);
        assert_eq!(history.latest().unwrap().iteration, 4);
    }

    #[test]
    fn test_last_n_shorter_history() {
        let mut history = MetricHistory::new(10);
        history.push(MetricSnapshot::new(0, 1.0));
        assert_eq!(history.last_n(4).len(), 1);
    }

    #[test]
    fn test_tracked_values() {
        let snap = MetricSnapshot::new(1, 80.0)
            .with_violations(2)
            .with_metric("latency_ms", 120.0);
        let tracked = snap.tracked();
        assert_eq!(tracked.len(), 3);
        assert_eq!(tracked["violations"], 2.0);
    }
}
