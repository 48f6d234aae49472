//! Convergence detection over a metric history.
//!
//! The tracker holds only thresholds; the history is owned by the caller
//! and passed in on every query.

use super::similarity::similarity;
use super::snapshot::{MetricHistory, MetricSnapshot};
use serde::{Deserialize, Serialize};

/// Scores closer than this are treated as equal when matching A-B-A-B.
const SCORE_EQ_EPSILON: f64 = 1e-9;

/// Why a refinement loop should stop. Variants are in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The latest violation count is zero.
    Converged,
    /// The iteration cap was reached.
    MaxIterations,
    /// Scores alternate A-B-A-B.
    Oscillation,
    /// Artifacts alternate between two near-identical versions.
    DiffOscillation,
    /// Scores stopped moving.
    Plateau,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Converged => "converged",
            StopReason::MaxIterations => "max_iterations",
            StopReason::Oscillation => "oscillation",
            StopReason::DiffOscillation => "diff_oscillation",
            StopReason::Plateau => "plateau",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceTracker {
    /// Number of most recent snapshots a plateau decision looks at.
    pub window: usize,
    /// Score change below which two iterations count as unchanged.
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Artifact similarity above which two versions count as the same.
    pub similarity_threshold: f64,
}

impl Default for ConvergenceTracker {
    fn default() -> Self {
        Self {
            window: 3,
            epsilon: 0.01,
            max_iterations: 10,
            similarity_threshold: 0.9,
        }
    }
}

impl ConvergenceTracker {
    pub fn new(window: usize, epsilon: f64, max_iterations: usize) -> Self {
        Self {
            window,
            epsilon,
            max_iterations,
            ..Self::default()
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Mean fractional change across the metrics tracked by both of the last
    /// two snapshots. 1.0 when fewer than two snapshots exist.
    pub fn delta(&self, history: &MetricHistory) -> f64 {
        let last = history.last_n(2);
        let [prev, curr] = last.as_slice() else {
            return 1.0;
        };
        let prev = prev.tracked();
        let curr = curr.tracked();

        let changes: Vec<f64> = curr
            .iter()
            .filter_map(|(name, new)| prev.get(name).map(|old| fractional_change(*old, *new)))
            .collect();
        if changes.is_empty() {
            return 1.0;
        }
        changes.iter().sum::<f64>() / changes.len() as f64
    }

    /// Whether every score step inside the last `window` snapshots is below
    /// epsilon. Histories shorter than the window never plateau.
    pub fn is_plateau(&self, history: &MetricHistory) -> bool {
        let window = self.window.max(2);
        if history.len() < window {
            return false;
        }
        history
            .last_n(window)
            .windows(2)
            .all(|pair| (pair[1].score - pair[0].score).abs() < self.epsilon)
    }

    /// Whether the last four scores alternate A-B-A-B with A ≠ B.
    pub fn is_oscillating(&self, history: &MetricHistory) -> bool {
        let last = history.last_n(4);
        let [a, b, c, d] = last.as_slice() else {
            return false;
        };
        let eq = |x: f64, y: f64| (x - y).abs() < SCORE_EQ_EPSILON;
        eq(a.score, c.score) && eq(b.score, d.score) && !eq(a.score, b.score)
    }

    /// Whether the last four artifacts alternate between two versions: A≈C
    /// and B≈D above the similarity threshold while A and B differ.
    pub fn is_diff_oscillating(&self, history: &MetricHistory) -> bool {
        let last = history.last_n(4);
        let artifacts: Vec<&str> = last
            .iter()
            .filter_map(|s| s.artifact.as_deref())
            .collect();
        let [a, b, c, d] = artifacts.as_slice() else {
            return false;
        };
        let th = self.similarity_threshold;
        similarity(a, c) > th && similarity(b, d) > th && similarity(a, b) <= th
    }

    pub fn is_converged(&self, history: &MetricHistory) -> bool {
        history
            .latest()
            .and_then(|s: &MetricSnapshot| s.violations)
            .is_some_and(|v| v == 0)
    }

    /// Dominant stop reason, if any, in precedence order.
    pub fn stop_reason(&self, history: &MetricHistory) -> Option<StopReason> {
        if self.is_converged(history) {
            Some(StopReason::Converged)
        } else if history.total_pushed() >= self.max_iterations {
            Some(StopReason::MaxIterations)
        } else if self.is_oscillating(history) {
            Some(StopReason::Oscillation)
        } else if self.is_diff_oscillating(history) {
            Some(StopReason::DiffOscillation)
        } else if self.is_plateau(history) {
            Some(StopReason::Plateau)
        } else {
            None
        }
    }

    pub fn should_stop(&self, history: &MetricHistory) -> bool {
        self.stop_reason(history).is_some()
    }
}

fn fractional_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        if new == 0.0 { 0.0 } else { 1.0 }
    } else {
        ((new - old) / old).abs()
    }
}
