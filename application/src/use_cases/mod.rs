//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent_pool;
pub mod deliberate;
pub mod heartbeat;
pub mod reasoning;

#[cfg(test)]
pub(crate) mod scripted;
