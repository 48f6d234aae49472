//! Domain layer for conclave
//!
//! This crate contains the entities, value objects and pure decision
//! algorithms of the orchestration core. It has no dependencies on
//! infrastructure, async runtimes or I/O.
//!
//! # Core Concepts
//!
//! ## Reasoning
//!
//! A [`Task`] is worked through with one of four [`Strategy`] variants.
//! Model output is parsed into a tagged [`Action`] and checked by a
//! [`SafetyPolicy`] before it reaches a toolbox.
//!
//! ## Deliberation
//!
//! [`Persona`]s vote on a [`Proposal`]; a [`DeliberationRound`] derives the
//! weighted consensus and its verdict. Any veto rejects the round.
//!
//! ## Convergence
//!
//! [`ConvergenceTracker`] decides when a refinement loop should stop, from
//! a bounded [`MetricHistory`].
//!
//! ## Agents and Heartbeat
//!
//! [`Agent`] lifecycle and per-scope [`AgentReputation`]; heartbeat routine
//! bookkeeping and the autonomy cycle's candidate selection.

pub mod agent;
pub mod config;
pub mod convergence;
pub mod core;
pub mod deliberation;
pub mod heartbeat;
pub mod prompt;
pub mod reasoning;
pub mod task;

// Re-export commonly used types
pub use agent::{Agent, AgentId, AgentReputation, AgentResult, AgentStatus, ScopeReputation};
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use convergence::{ConvergenceTracker, MetricHistory, MetricSnapshot, StopReason};
pub use core::{
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState},
    error::DomainError,
    model::{ModelId, Tier},
};
pub use deliberation::{
    DeliberationOutcome, DeliberationRound, Persona, PersonaVote, Proposal, Verdict,
};
pub use heartbeat::{
    BackoffPolicy, CandidateActionSet, CandidateStrategy, HeartbeatCheck, JobDescriptor,
    VerificationReport,
};
pub use prompt::{AutonomyPromptTemplate, CouncilPromptTemplate, ReasoningPromptTemplate};
pub use reasoning::{Action, Observation, ReasoningSession, SafetyPolicy, SafetyVerdict, Step, Strategy};
pub use task::Task;
