use super::ModelBackend;
use async_trait::async_trait;
use chrono::Utc;
use conclave_application::{ModelError, ModelReply, ModelRequest, ModelService};
use conclave_domain::{CircuitBreaker, CircuitBreakerConfig, CircuitState, ModelId, Tier};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// [`ModelService`] that resolves tiers to ordered model lists and skips
/// models whose circuit is open.
///
/// Routing order for a request:
///  1. an explicit `request.model` is called directly (if its circuit allows);
///  2. otherwise each model of the requested tier in configured order;
///  3. then the remaining tiers, cheapest first ([`Tier::fallback_order`]).
///
/// Every call outcome is recorded on the model's breaker.
pub struct RoutingModelService {
    backend: Arc<dyn ModelBackend>,
    tiers: BTreeMap<Tier, Vec<ModelId>>,
    breakers: Mutex<HashMap<ModelId, CircuitBreaker>>,
    breaker_config: CircuitBreakerConfig,
}

impl RoutingModelService {
    pub fn new(backend: Arc<dyn ModelBackend>, tiers: BTreeMap<Tier, Vec<ModelId>>) -> Self {
        Self {
            backend,
            tiers,
            breakers: Mutex::new(HashMap::new()),
            breaker_config: CircuitBreakerConfig::default(),
        }
    }

    pub fn with_breaker_config(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker_config = config;
        self
    }

    pub fn models_for(&self, tier: Tier) -> &[ModelId] {
        self.tiers.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn circuit_state(&self, model: &ModelId) -> CircuitState {
        self.with_breakers(|b| b.get(model).map_or(CircuitState::Closed, |c| c.state()))
    }

    fn with_breakers<T>(&self, f: impl FnOnce(&mut HashMap<ModelId, CircuitBreaker>) -> T) -> T {
        let mut guard = self.breakers.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn try_acquire(&self, model: &ModelId) -> bool {
        let config = &self.breaker_config;
        self.with_breakers(|b| b.entry(model.clone()).or_default().try_acquire(Utc::now(), config))
    }

    async fn call(&self, model: &ModelId, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let result = self
            .backend
            .complete(model, request.system.as_deref(), &request.prompt)
            .await;
        let config = &self.breaker_config;
        self.with_breakers(|b| {
            let breaker = b.entry(model.clone()).or_default();
            match &result {
                Ok(_) => breaker.record_success(config),
                Err(_) => breaker.record_failure(Utc::now(), config),
            }
        });
        result
    }
}

#[async_trait]
impl ModelService for RoutingModelService {
    async fn ask(&self, request: ModelRequest) -> Result<ModelReply, ModelError> {
        if let Some(model) = &request.model {
            if !self.try_acquire(model) {
                return Err(ModelError::ModelNotAvailable(format!(
                    "{} (circuit open)",
                    model
                )));
            }
            return self.call(model, &request).await;
        }

        let mut last_error = None;
        for tier in request.tier.fallback_order() {
            for model in self.models_for(tier) {
                if !self.try_acquire(model) {
                    debug!(model = %model, "Skipping model with open circuit");
                    continue;
                }
                match self.call(model, &request).await {
                    Ok(reply) => return Ok(reply),
                    Err(e) => {
                        warn!(model = %model, tier = %tier, error = %e, "Model call failed, trying next");
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(ModelError::AllModelsUnavailable(request.tier)))
    }

    fn is_available(&self, model: &ModelId) -> bool {
        let config = &self.breaker_config;
        self.with_breakers(|b| b.get(model).is_none_or(|c| c.is_closed_at(Utc::now(), config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Backend that fails for a fixed set of models and records every call.
    struct FlakyBackend {
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FlakyBackend {
        fn new(failing: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelBackend for FlakyBackend {
        async fn complete(
            &self,
            model: &ModelId,
            _system: Option<&str>,
            prompt: &str,
        ) -> Result<ModelReply, ModelError> {
            self.calls.lock().unwrap().push(model.to_string());
            if self.failing.contains(model.as_str()) {
                Err(ModelError::RequestFailed("boom".to_string()))
            } else {
                Ok(ModelReply::new(format!("{}: {}", model, prompt), model.clone(), 0.01))
            }
        }
    }

    fn tiers() -> BTreeMap<Tier, Vec<ModelId>> {
        BTreeMap::from([
            (Tier::Fast, vec![ModelId::new("fast-1")]),
            (Tier::Balanced, vec![ModelId::new("bal-1"), ModelId::new("bal-2")]),
            (Tier::Deep, vec![ModelId::new("deep-1")]),
        ])
    }

    fn config(threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_model_of_tier_answers() {
        let backend = FlakyBackend::new(&[]);
        let service = RoutingModelService::new(backend.clone(), tiers());

        let reply = service
            .ask(ModelRequest::new("hi").with_tier(Tier::Balanced))
            .await
            .unwrap();
        assert_eq!(reply.model, ModelId::new("bal-1"));
        assert_eq!(backend.calls(), vec!["bal-1"]);
    }

    #[tokio::test]
    async fn test_retries_next_model_then_next_tier() {
        let backend = FlakyBackend::new(&["bal-1", "bal-2"]);
        let service = RoutingModelService::new(backend.clone(), tiers());

        let reply = service
            .ask(ModelRequest::new("hi").with_tier(Tier::Balanced))
            .await
            .unwrap();
        // balanced exhausted, then fast (cheapest remaining tier)
        assert_eq!(reply.model, ModelId::new("fast-1"));
        assert_eq!(backend.calls(), vec!["bal-1", "bal-2", "fast-1"]);
    }

    #[tokio::test]
    async fn test_open_circuit_is_skipped() {
        let backend = FlakyBackend::new(&["bal-1"]);
        let service = RoutingModelService::new(backend.clone(), tiers()).with_breaker_config(config(1));

        service
            .ask(ModelRequest::new("a").with_tier(Tier::Balanced))
            .await
            .unwrap();
        assert_eq!(service.circuit_state(&ModelId::new("bal-1")), CircuitState::Open);
        assert!(!service.is_available(&ModelId::new("bal-1")));
        assert!(service.is_available(&ModelId::new("bal-2")));

        service
            .ask(ModelRequest::new("b").with_tier(Tier::Balanced))
            .await
            .unwrap();
        assert_eq!(backend.calls(), vec!["bal-1", "bal-2", "bal-2"]);
    }

    #[tokio::test]
    async fn test_explicit_model_override() {
        let backend = FlakyBackend::new(&["deep-1"]);
        let service = RoutingModelService::new(backend.clone(), tiers()).with_breaker_config(config(1));

        let reply = service
            .ask(ModelRequest::new("x").with_model(ModelId::new("outside-any-tier")))
            .await
            .unwrap();
        assert_eq!(reply.model, ModelId::new("outside-any-tier"));

        let err = service
            .ask(ModelRequest::new("x").with_model(ModelId::new("deep-1")))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::RequestFailed(_)));

        // Circuit is now open; the override is refused without calling the backend
        let err = service
            .ask(ModelRequest::new("x").with_model(ModelId::new("deep-1")))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ModelNotAvailable(_)));
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_no_models_configured() {
        let service = RoutingModelService::new(FlakyBackend::new(&[]), BTreeMap::new());
        let err = service
            .ask(ModelRequest::new("x").with_tier(Tier::Deep))
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::AllModelsUnavailable(Tier::Deep));
    }
}
