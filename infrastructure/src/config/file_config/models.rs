//! Tier-based model configuration from TOML (`[models]` section)

use conclave_domain::{CircuitBreakerConfig, ConfigIssue, ConfigIssueCode, ModelId, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tier-based model configuration from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// command = "llm"                       # prompt on stdin, reply on stdout
/// args = ["--model", "{model}"]
/// fast = ["gpt-5-mini"]
/// balanced = ["claude-sonnet-4.5", "gpt-5.2-codex"]
/// deep = ["claude-opus-4.5"]
///
/// [models.prices]
/// "claude-opus-4.5" = 0.015            # USD per 1k tokens
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// External command every model call is piped through
    pub command: Option<String>,
    /// Arguments for `command`; `{model}` is replaced with the model id
    pub args: Vec<String>,
    pub fast: Vec<String>,
    pub balanced: Vec<String>,
    pub deep: Vec<String>,
    /// Price used for models missing from `prices`
    pub default_price_per_1k: f64,
    pub prices: BTreeMap<String, f64>,
    pub timeout_secs: u64,
    pub circuit: FileCircuitConfig,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            fast: Vec::new(),
            balanced: Vec::new(),
            deep: Vec::new(),
            default_price_per_1k: 0.002,
            prices: BTreeMap::new(),
            timeout_secs: 120,
            circuit: FileCircuitConfig::default(),
        }
    }
}

/// Circuit breaker settings (`[models.circuit]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCircuitConfig {
    pub failure_threshold: u32,
    pub open_timeout_secs: u64,
    pub success_threshold: u32,
}

impl Default for FileCircuitConfig {
    fn default() -> Self {
        let defaults = CircuitBreakerConfig::default();
        Self {
            failure_threshold: defaults.failure_threshold,
            open_timeout_secs: defaults.open_timeout.num_seconds().max(0) as u64,
            success_threshold: defaults.success_threshold,
        }
    }
}

impl FileCircuitConfig {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold.max(1),
            open_timeout: chrono::Duration::seconds(self.open_timeout_secs as i64),
            success_threshold: self.success_threshold.max(1),
        }
    }
}

impl FileModelsConfig {
    /// Raw model names configured for a tier.
    fn names(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Fast => &self.fast,
            Tier::Balanced => &self.balanced,
            Tier::Deep => &self.deep,
        }
    }

    /// Parse a tier's model list, collecting issues for empty names.
    pub fn parse_tier(&self, tier: Tier) -> (Vec<ModelId>, Vec<ConfigIssue>) {
        let mut models = Vec::new();
        let mut issues = Vec::new();
        for name in self.names(tier) {
            if name.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName,
                    format!("models.{}: model name cannot be empty in list", tier),
                ));
            } else {
                models.push(ModelId::new(name.trim()));
            }
        }
        (models, issues)
    }

    /// Every tier with its parsed models, in tier order.
    pub fn tiers(&self) -> BTreeMap<Tier, Vec<ModelId>> {
        Tier::ALL
            .into_iter()
            .map(|tier| (tier, self.parse_tier(tier).0))
            .collect()
    }

    /// All distinct configured models.
    pub fn all_models(&self) -> Vec<ModelId> {
        let mut all: Vec<ModelId> = self.tiers().into_values().flatten().collect();
        all.sort();
        all.dedup();
        all
    }

    pub fn price_for(&self, model: &ModelId) -> f64 {
        self.prices
            .get(model.as_str())
            .copied()
            .unwrap_or(self.default_price_per_1k)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mut configured = 0;
        let mut empty = Vec::new();
        for tier in Tier::ALL {
            let (models, tier_issues) = self.parse_tier(tier);
            issues.extend(tier_issues);
            if models.is_empty() {
                empty.push(tier);
            } else {
                configured += 1;
            }
        }
        // An unconfigured setup is valid; a partial one falls back across tiers.
        if configured > 0 {
            for tier in empty {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::EmptyTier,
                    format!(
                        "models.{}: no models configured, requests fall back to other tiers",
                        tier
                    ),
                ));
            }
        }
        if configured > 0 && self.command.as_deref().is_none_or(|c| c.trim().is_empty()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingCommand,
                "models.command: models are configured but no backend command is set",
            ));
        }
        for (model, price) in &self.prices {
            if *price < 0.0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::RatioOutOfRange,
                    format!("models.prices.{}: price {} is negative", model, price),
                ));
            }
        }
        issues
    }
}
