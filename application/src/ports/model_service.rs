//! Model service port
//!
//! Defines the interface every model-backed use case talks through. Routing,
//! circuit breaking and tier fallback live behind it in the infrastructure
//! layer.

use async_trait::async_trait;
use conclave_domain::{ModelId, Tier};
use thiserror::Error;

/// Errors that can occur while asking a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("No model available for tier {0} or its fallbacks")]
    AllModelsUnavailable(Tier),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// A single prompt sent to a model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub prompt: String,
    pub system: Option<String>,
    /// Capability tier the router should pick a model from.
    pub tier: Tier,
    /// Pin a specific model instead of routing by tier.
    pub model: Option<ModelId>,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            tier: Tier::default(),
            model: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = Some(model);
        self
    }
}

/// A model's reply with its accounted cost
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub content: String,
    /// Model that actually answered.
    pub model: ModelId,
    pub cost: f64,
}

impl ModelReply {
    pub fn new(content: impl Into<String>, model: ModelId, cost: f64) -> Self {
        Self {
            content: content.into(),
            model,
            cost,
        }
    }
}

/// Gateway for model communication
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Send a prompt and wait for the full reply.
    async fn ask(&self, request: ModelRequest) -> Result<ModelReply, ModelError>;

    /// Whether the model may currently be called (its circuit is not open).
    fn is_available(&self, model: &ModelId) -> bool;
}
