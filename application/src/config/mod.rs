//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`ReasoningParams`]: reasoning loop control (steps, duration, tiers)
//! - [`CouncilParams`]: deliberation rounds, thresholds and roster
//! - [`PoolParams`], [`HeartbeatParams`], [`AutonomyParams`]: runtime loops
//! - [`OrchestrationConfig`]: container the CLI hands out slices of

pub mod council_params;
pub mod orchestration_config;
pub mod reasoning_params;
pub mod runtime_params;

pub use council_params::CouncilParams;
pub use orchestration_config::{OrchestrationConfig, SafetyParams};
pub use reasoning_params::ReasoningParams;
pub use runtime_params::{AutonomyParams, HeartbeatParams, PoolParams};
