//! Job queue adapters

mod in_memory;

pub use in_memory::{InMemoryJobQueue, JobRunner, ShellJobRunner};
