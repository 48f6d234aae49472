//! Circuit breaker for per-model failure tracking.
//!
//! A model whose calls keep failing is temporarily excluded from selection.
//! After `open_timeout` the breaker lets trial calls through (half-open);
//! enough successes close it again, any failure reopens it.
//!
//! Time is passed in explicitly so the state machine stays pure.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for circuit breakers.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before half-open probing.
    pub open_timeout: Duration,
    /// Successful half-open calls needed to close the circuit.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::seconds(120),
            success_threshold: 1,
        }
    }
}

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are blocked.
    Open,
    /// Trial calls are allowed to test recovery.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<DateTime<Utc>>,
    open_count: u32,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            half_open_successes: 0,
            opened_at: None,
            open_count: 0,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    /// Read-only check whether a call would currently be permitted.
    pub fn is_closed_at(&self, now: DateTime<Utc>, config: &CircuitBreakerConfig) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => self.open_timeout_elapsed(now, config),
        }
    }

    /// Check whether a call may proceed, moving an expired open circuit to half-open.
    pub fn try_acquire(&mut self, now: DateTime<Utc>, config: &CircuitBreakerConfig) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if self.open_timeout_elapsed(now, config) {
                    self.state = CircuitState::HalfOpen;
                    self.half_open_successes = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&mut self, config: &CircuitBreakerConfig) {
        self.consecutive_failures = 0;
        if self.state == CircuitState::HalfOpen {
            self.half_open_successes += 1;
            if self.half_open_successes >= config.success_threshold {
                self.state = CircuitState::Closed;
                self.opened_at = None;
            }
        }
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>, config: &CircuitBreakerConfig) {
        self.consecutive_failures += 1;
        match self.state {
            CircuitState::HalfOpen => self.open(now),
            CircuitState::Closed if self.consecutive_failures >= config.failure_threshold => {
                self.open(now)
            }
            _ => {}
        }
    }

    fn open(&mut self, now: DateTime<Utc>) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.half_open_successes = 0;
        self.open_count += 1;
    }

    fn open_timeout_elapsed(&self, now: DateTime<Utc>, config: &CircuitBreakerConfig) -> bool {
        self.opened_at
            .is_none_or(|opened| now - opened >= config.open_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::seconds(60),
            success_threshold: 1,
        }
    }

    #[test]
    fn test_opens_after_threshold() {
        let cfg = config();
        let now = Utc::now();
        let mut breaker = CircuitBreaker::new();

        breaker.record_failure(now, &cfg);
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure(now, &cfg);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.is_closed_at(now, &cfg));
        assert_eq!(breaker.open_count(), 1);
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let cfg = config();
        let now = Utc::now();
        let mut breaker = CircuitBreaker::new();

        breaker.record_failure(now, &cfg);
        breaker.record_success(&cfg);
        breaker.record_failure(now, &cfg);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_after_timeout_then_close() {
        let cfg = config();
        let opened = Utc::now();
        let mut breaker = CircuitBreaker::new();
        breaker.record_failure(opened, &cfg);
        breaker.record_failure(opened, &cfg);

        assert!(!breaker.try_acquire(opened + Duration::seconds(30), &cfg));
        assert!(breaker.try_acquire(opened + Duration::seconds(61), &cfg));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success(&cfg);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cfg = config();
        let opened = Utc::now();
        let mut breaker = CircuitBreaker::new();
        breaker.record_failure(opened, &cfg);
        breaker.record_failure(opened, &cfg);

        let later = opened + Duration::seconds(61);
        assert!(breaker.try_acquire(later, &cfg));
        breaker.record_failure(later, &cfg);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.open_count(), 2);
    }
}
