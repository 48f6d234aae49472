//! Reasoning domain: strategies, actions, step log and safety gating.
//!
//! Everything here is pure; the executor that drives model calls and the
//! toolbox lives in the application layer.

pub mod action;
pub mod response;
pub mod safety;
pub mod session;
pub mod step;
pub mod strategy;

pub use action::Action;
pub use response::{
    PlannedAction, Reflection, StepResponse, parse_batch_plan, parse_numbered_plan,
    parse_reflection, parse_step_response, substitute_placeholders,
};
pub use safety::{SafetyPolicy, SafetyVerdict};
pub use session::ReasoningSession;
pub use step::{Observation, Step};
pub use strategy::Strategy;
