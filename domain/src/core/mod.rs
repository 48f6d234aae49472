//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelId`] / [`model::Tier`]: model identity and quality/cost class
//! - [`circuit_breaker::CircuitBreaker`]: per-model failure tracking
//! - [`error::DomainError`]: domain-level errors

pub mod circuit_breaker;
pub mod error;
pub mod model;
pub mod string;
