//! Model identity and tier value objects

use serde::{Deserialize, Serialize};

/// Identifier of a language model as understood by the model-call service
/// (e.g. `"claude-sonnet-4.5"`, `"gpt-5-mini"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get a short display name for the model
    ///
    /// E.g., "claude-sonnet-4.5" -> "claude"
    pub fn family(&self) -> &str {
        self.0.split(['-', '_']).next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Quality/cost class of a model, selectable per call.
///
/// | Tier | Typical use |
/// |------|-------------|
/// | `Fast` | persona votes, heuristic questions, reflections |
/// | `Balanced` | reasoning steps, plans, synthesis |
/// | `Deep` | arbitration, direct fallback answers |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Fast,
    #[default]
    Balanced,
    Deep,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Fast, Tier::Balanced, Tier::Deep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Balanced => "balanced",
            Tier::Deep => "deep",
        }
    }

    /// Order in which tiers are tried when every model of `self` failed:
    /// the requested tier first, then the remaining tiers from cheapest up.
    pub fn fallback_order(self) -> Vec<Tier> {
        let mut order = vec![self];
        order.extend(Tier::ALL.into_iter().filter(|t| *t != self));
        order
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" | "cheap" => Ok(Tier::Fast),
            "balanced" | "default" => Ok(Tier::Balanced),
            "deep" | "premium" => Ok(Tier::Deep),
            other => Err(format!(
                "Unknown tier: {}. Valid: fast, balanced, deep",
                other
            )),
        }
    }
}
