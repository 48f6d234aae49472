//! Model backends and tier routing.
//!
//! A [`ModelBackend`] knows how to reach one family of models. The
//! [`RoutingModelService`](routing::RoutingModelService) sits in front of it,
//! resolving tiers to model lists and keeping a circuit breaker per model.

pub mod command;
pub mod routing;

use crate::config::FileModelsConfig;
use async_trait::async_trait;
use command::CommandModelBackend;
use conclave_application::{ModelError, ModelReply};
use conclave_domain::ModelId;
use routing::RoutingModelService;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(
        &self,
        model: &ModelId,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<ModelReply, ModelError>;
}

/// Rough token estimate used for cost accounting (4 characters per token).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Build the routing service for `[models]`, or `None` when no backend
/// command is configured.
pub fn model_service_from_config(config: &FileModelsConfig) -> Option<RoutingModelService> {
    let program = config.command.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
    let backend = CommandModelBackend::new(program, config.args.clone())
        .with_timeout(Duration::from_secs(config.timeout_secs))
        .with_prices(config.default_price_per_1k, config.prices.clone());
    Some(
        RoutingModelService::new(Arc::new(backend), config.tiers())
            .with_breaker_config(config.circuit.to_breaker_config()),
    )
}
