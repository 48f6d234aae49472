//! Infrastructure layer for conclave
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod jobs;
pub mod logging;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoadError, ConfigLoader, FileConfig};
pub use jobs::{InMemoryJobQueue, JobRunner, ShellJobRunner};
pub use logging::JsonlEventLog;
pub use providers::{
    ModelBackend, command::CommandModelBackend, model_service_from_config,
    routing::RoutingModelService,
};
pub use tools::LocalToolbox;
