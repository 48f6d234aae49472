//! Port for structured orchestration event logging.
//!
//! Defines the [`EventLog`] trait for recording what the orchestration core
//! did (strategy fallbacks, council rounds, agent terminations, heartbeat
//! cycles) as machine-readable records.
//!
//! This is separate from `tracing`-based operation logs: tracing carries
//! human-readable diagnostics, while this port keeps a replayable record
//! (JSONL in the infrastructure adapter).

use serde_json::Value;

/// A structured orchestration event
pub struct OrchestrationEvent {
    /// Event type identifier (e.g., "strategy_fallback", "council_round").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl OrchestrationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging orchestration events
///
/// `log` is synchronous and non-fallible; a logging failure never interrupts
/// the use case that emitted the event.
pub trait EventLog: Send + Sync {
    fn log(&self, event: OrchestrationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoEventLog;

impl EventLog for NoEventLog {
    fn log(&self, _event: OrchestrationEvent) {}
}
