//! Heartbeat routine bookkeeping and backoff policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);

/// Clamp a heartbeat interval into `[5s, 3600s]`.
pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

/// Exponential backoff for repeatedly failing routines.
///
/// `backoff = min(base × 2^failures, max)`, applied only once failures
/// exceed `failure_threshold` so transient failures do not slow the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub base_secs: u64,
    pub max_secs: u64,
    pub failure_threshold: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_secs: 30,
            max_secs: 3600,
            failure_threshold: 2,
        }
    }
}

impl BackoffPolicy {
    /// Raw backoff for a failure count, ignoring the threshold.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let secs = 2u64
            .checked_pow(failures)
            .and_then(|factor| self.base_secs.checked_mul(factor))
            .map_or(self.max_secs, |s| s.min(self.max_secs));
        Duration::from_secs(secs)
    }

    /// Backoff to honor, if the failure count is past the threshold.
    pub fn backoff_for(&self, failures: u32) -> Option<Duration> {
        (failures > self.failure_threshold).then(|| self.delay_for(failures))
    }
}

/// A named periodic routine's run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatCheck {
    pub name: String,
    pub last_run: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub total_runs: u64,
    pub last_error: Option<String>,
}

impl HeartbeatCheck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_run: None,
            consecutive_failures: 0,
            total_runs: 0,
            last_error: None,
        }
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
        self.total_runs += 1;
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>, error: impl Into<String>) {
        self.last_run = Some(now);
        self.total_runs += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.into());
    }

    pub fn backoff(&self, policy: &BackoffPolicy) -> Option<Duration> {
        policy.backoff_for(self.consecutive_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_interval() {
        assert_eq!(clamp_interval(Duration::from_secs(1)), MIN_INTERVAL);
        assert_eq!(clamp_interval(Duration::from_secs(60)), Duration::from_secs(60));
        assert_eq!(clamp_interval(Duration::from_secs(99_999)), MAX_INTERVAL);
    }

    #[test]
    fn test_backoff_growth_and_cap() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(30));
        assert_eq!(policy.delay_for(3), Duration::from_secs(240));
        assert_eq!(policy.delay_for(7), Duration::from_secs(3600));
        assert_eq!(policy.delay_for(200), Duration::from_secs(3600));
    }

    #[test]
    fn test_backoff_threshold() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.backoff_for(1), None);
        assert_eq!(policy.backoff_for(2), None);
        assert_eq!(policy.backoff_for(3), Some(Duration::from_secs(240)));
    }

    #[test]
    fn test_check_success_resets_failures() {
        let mut check = HeartbeatCheck::new("autonomy");
        let now = Utc::now();
        for _ in 0..3 {
            check.record_failure(now, "queue offline");
        }
        assert_eq!(check.consecutive_failures, 3);
        assert!(check.backoff(&BackoffPolicy::default()).is_some());

        check.record_success(now);
        assert_eq!(check.consecutive_failures, 0);
        assert_eq!(check.total_runs, 4);
        assert!(check.last_error.is_none());
        assert!(check.backoff(&BackoffPolicy::default()).is_none());
    }
}
