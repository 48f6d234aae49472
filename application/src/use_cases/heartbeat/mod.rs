//! Heartbeat use case
//!
//! A [`HeartbeatScheduler`] runs every registered [`HeartbeatRoutine`] once per
//! cycle, tracks consecutive failures per routine, and sleeps for the largest
//! backoff any failing routine asks for (or the base interval). Ordinary routine
//! failures only back off; a panicking routine disables the loop.

pub mod autonomy;
pub mod decision;

pub use autonomy::{AutonomyCycle, AutonomyReport, IterationRecord};
pub use decision::ModelDecisionService;

use crate::config::HeartbeatParams;
use crate::ports::event_log::{EventLog, NoEventLog, OrchestrationEvent};
use crate::ports::job_queue::JobQueueError;
use async_trait::async_trait;
use chrono::Utc;
use conclave_domain::heartbeat::clamp_interval;
use conclave_domain::{BackoffPolicy, HeartbeatCheck};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// An expected routine failure; it counts toward backoff
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutineError {
    #[error("Job queue error: {0}")]
    JobQueue(#[from] JobQueueError),

    #[error("Routine failed: {0}")]
    Failed(String),
}

/// Errors that stop the heartbeat loop
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeartbeatError {
    #[error("Routine '{0}' panicked")]
    RoutinePanicked(String),
}

/// What a successful routine run reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutineReport {
    pub summary: String,
    pub score: Option<f64>,
}

/// A periodic check run by the scheduler
#[async_trait]
pub trait HeartbeatRoutine: Send + Sync {
    async fn run(&self) -> Result<RoutineReport, RoutineError>;
}

struct RegisteredRoutine {
    check: HeartbeatCheck,
    routine: Arc<dyn HeartbeatRoutine>,
}

/// One routine's result within a cycle
#[derive(Debug, Clone)]
pub struct RoutineOutcome {
    pub name: String,
    pub result: Result<RoutineReport, RoutineError>,
}

/// Results of one cycle and how long to sleep before the next
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcomes: Vec<RoutineOutcome>,
    pub sleep: Duration,
}

pub struct HeartbeatScheduler {
    routines: Mutex<Vec<RegisteredRoutine>>,
    interval: Duration,
    backoff: BackoffPolicy,
    disabled: AtomicBool,
    event_log: Arc<dyn EventLog>,
}

impl HeartbeatScheduler {
    pub fn new(params: &HeartbeatParams) -> Self {
        let interval = clamp_interval(params.interval);
        if interval != params.interval {
            warn!(
                "Heartbeat interval {:?} clamped to {:?}",
                params.interval, interval
            );
        }
        Self {
            routines: Mutex::new(Vec::new()),
            interval,
            backoff: params.backoff,
            disabled: AtomicBool::new(false),
            event_log: Arc::new(NoEventLog),
        }
    }

    pub fn with_event_log(mut self, event_log: Arc<dyn EventLog>) -> Self {
        self.event_log = event_log;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register a routine; a routine with the same name is replaced and its
    /// failure record reset.
    pub async fn register(&self, name: impl Into<String>, routine: Arc<dyn HeartbeatRoutine>) {
        let name = name.into();
        let mut routines = self.routines.lock().await;
        routines.retain(|p| p.check.name != name);
        debug!("Registered heartbeat routine '{}'", name);
        routines.push(RegisteredRoutine {
            check: HeartbeatCheck::new(name),
            routine,
        });
    }

    /// Snapshot of every routine's run record.
    pub async fn checks(&self) -> Vec<HeartbeatCheck> {
        self.routines
            .lock()
            .await
            .iter()
            .map(|p| p.check.clone())
            .collect()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Run every routine once.
    pub async fn run_cycle(&self) -> Result<CycleReport, HeartbeatError> {
        let mut routines = self.routines.lock().await;
        let mut outcomes = Vec::with_capacity(routines.len());
        let mut sleep: Option<Duration> = None;

        for registered in routines.iter_mut() {
            let name = registered.check.name.clone();
            let run = AssertUnwindSafe(registered.routine.run()).catch_unwind().await;
            let result = match run {
                Ok(result) => result,
                Err(_panic) => return Err(HeartbeatError::RoutinePanicked(name)),
            };

            let now = Utc::now();
            match &result {
                Ok(report) => {
                    debug!("Routine '{}' ok: {}", name, report.summary);
                    registered.check.record_success(now);
                }
                Err(e) => {
                    warn!("Routine '{}' failed: {}", name, e);
                    registered.check.record_failure(now, e.to_string());
                }
            }
            if let Some(backoff) = registered.check.backoff(&self.backoff) {
                info!(
                    "Routine '{}' backing off for {:?} after {} failures",
                    name, backoff, registered.check.consecutive_failures
                );
                sleep = Some(sleep.map_or(backoff, |s| s.max(backoff)));
            }
            self.event_log.log(OrchestrationEvent::new(
                "heartbeat_routine",
                serde_json::json!({
                    "routine": name,
                    "ok": result.is_ok(),
                    "consecutive_failures": registered.check.consecutive_failures,
                }),
            ));
            outcomes.push(RoutineOutcome { name, result });
        }

        Ok(CycleReport {
            outcomes,
            sleep: sleep.unwrap_or(self.interval),
        })
    }

    /// Run cycles until the token is cancelled or a routine panics.
    pub fn start(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Heartbeat started (interval {:?})", self.interval);
            loop {
                let sleep = match self.run_cycle().await {
                    Ok(report) => report.sleep,
                    Err(e) => {
                        error!("Heartbeat disabled: {}", e);
                        self.disabled.store(true, Ordering::SeqCst);
                        break;
                    }
                };
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Heartbeat stopped");
                        break;
                    }
                    _ = tokio::time::sleep(sleep) => {}
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    struct ScriptedRoutine {
        results: StdMutex<VecDeque<Result<RoutineReport, RoutineError>>>,
        panics: bool,
    }

    impl ScriptedRoutine {
        fn new(results: Vec<Result<RoutineReport, RoutineError>>) -> Self {
            Self {
                results: StdMutex::new(results.into()),
                panics: false,
            }
        }

        fn panicking() -> Self {
            Self {
                results: StdMutex::new(VecDeque::new()),
                panics: true,
            }
        }
    }

    #[async_trait]
    impl HeartbeatRoutine for ScriptedRoutine {
        async fn run(&self) -> Result<RoutineReport, RoutineError> {
            if self.panics {
                panic!("routine exploded");
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RoutineReport::default()))
        }
    }

    fn failure() -> Result<RoutineReport, RoutineError> {
        Err(RoutineError::Failed("down".to_string()))
    }

    #[tokio::test]
    async fn test_sleeps_for_largest_backoff() {
        let scheduler = HeartbeatScheduler::new(&HeartbeatParams::default());
        scheduler
            .register("healthy", Arc::new(ScriptedRoutine::new(Vec::new())))
            .await;
        scheduler
            .register(
                "flaky",
                Arc::new(ScriptedRoutine::new(vec![failure(), failure(), failure()])),
            )
            .await;

        // failures 1 and 2 stay under the threshold
        for _ in 0..2 {
            let report = scheduler.run_cycle().await.unwrap();
            assert_eq!(report.sleep, Duration::from_secs(60));
        }
        let report = scheduler.run_cycle().await.unwrap();
        assert_eq!(report.sleep, Duration::from_secs(240));
        assert!(report.outcomes[1].result.is_err());

        let checks = scheduler.checks().await;
        assert_eq!(checks[0].consecutive_failures, 0);
        assert_eq!(checks[1].consecutive_failures, 3);
        assert_eq!(checks[1].total_runs, 3);
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let scheduler = HeartbeatScheduler::new(&HeartbeatParams::default());
        scheduler
            .register(
                "p",
                Arc::new(ScriptedRoutine::new(vec![failure(), Ok(RoutineReport::default())])),
            )
            .await;

        scheduler.run_cycle().await.unwrap();
        scheduler.run_cycle().await.unwrap();

        let check = &scheduler.checks().await[0];
        assert_eq!(check.consecutive_failures, 0);
        assert!(check.last_error.is_none());
    }

    #[tokio::test]
    async fn test_register_replaces_same_name() {
        let scheduler = HeartbeatScheduler::new(&HeartbeatParams::default());
        scheduler
            .register("p", Arc::new(ScriptedRoutine::new(vec![failure()])))
            .await;
        scheduler.run_cycle().await.unwrap();
        scheduler
            .register("p", Arc::new(ScriptedRoutine::new(Vec::new())))
            .await;

        let checks = scheduler.checks().await;
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].total_runs, 0);
    }

    #[test]
    fn test_interval_is_clamped() {
        let scheduler =
            HeartbeatScheduler::new(&HeartbeatParams::default().with_interval(Duration::from_secs(1)));
        assert_eq!(scheduler.interval(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_panicking_routine_disables_loop() {
        let scheduler = Arc::new(HeartbeatScheduler::new(&HeartbeatParams::default()));
        scheduler
            .register("bad", Arc::new(ScriptedRoutine::panicking()))
            .await;

        let handle = scheduler.clone().start(CancellationToken::new());
        handle.await.unwrap();

        assert!(scheduler.is_disabled());
    }

    #[tokio::test]
    async fn test_cancel_stops_loop() {
        let scheduler = Arc::new(HeartbeatScheduler::new(&HeartbeatParams::default()));
        scheduler
            .register("ok", Arc::new(ScriptedRoutine::new(Vec::new())))
            .await;
        let token = CancellationToken::new();

        let handle = scheduler.clone().start(token.clone());
        token.cancel();
        handle.await.unwrap();

        assert!(!scheduler.is_disabled());
    }
}
