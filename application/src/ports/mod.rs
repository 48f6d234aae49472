//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod artifact_reviewer;
pub mod decision;
pub mod event_log;
pub mod job_queue;
pub mod model_service;
pub mod toolbox;
