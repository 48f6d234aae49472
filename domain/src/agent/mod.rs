//! Agent domain
//!
//! An [`Agent`] is one bounded, budgeted, time-limited execution of a
//! [`Task`](crate::task::Task), optionally spawned by a parent agent.

pub mod entities;
pub mod reputation;

pub use entities::{Agent, AgentId, AgentResult, AgentStatus};
pub use reputation::{AgentReputation, ScopeReputation};
