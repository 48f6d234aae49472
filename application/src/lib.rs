//! Application layer for conclave
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{
    AutonomyParams, CouncilParams, HeartbeatParams, OrchestrationConfig, PoolParams,
    ReasoningParams, SafetyParams,
};
pub use ports::{
    artifact_reviewer::ArtifactReviewer,
    decision::DecisionService,
    event_log::{EventLog, NoEventLog, OrchestrationEvent},
    job_queue::{JobQueue, JobQueueError, JobRun, TickReport},
    model_service::{ModelError, ModelReply, ModelRequest, ModelService},
    toolbox::{NoTools, Toolbox},
};
pub use use_cases::agent_pool::{AgentPool, AgentRun, ParentRef, PoolRunSummary, TaskRunner};
pub use use_cases::deliberate::{DeliberationEngine, DeliberationError};
pub use use_cases::heartbeat::{
    AutonomyCycle, AutonomyReport, CycleReport, HeartbeatError, HeartbeatRoutine,
    HeartbeatScheduler, ModelDecisionService, RoutineError, RoutineReport,
};
pub use use_cases::reasoning::{
    FallbackStage, ReasoningError, ReasoningExecutor, ReasoningOutcome,
};
