//! Council configuration from TOML (`[council]` and `[[council.personas]]`)

use conclave_application::CouncilParams;
use conclave_domain::{ConfigIssue, ConfigIssueCode, ModelId, Persona, Tier};
use serde::{Deserialize, Serialize};

/// Council configuration from TOML
///
/// # Example
///
/// ```toml
/// [council]
/// participants = ["claude-sonnet-4.5", "gpt-5.2-codex"]
/// arbiter = "claude-opus-4.5"
/// threshold = 0.7
///
/// [[council.personas]]
/// name = "security"
/// weight = 1.0
/// veto = true
/// directive = "Look for injection and secret leakage."
/// ```
///
/// Without `[[council.personas]]` the built-in roster is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Proposal models; the balanced tier is used when empty
    pub participants: Vec<String>,
    pub arbiter: Option<String>,
    pub max_rounds: usize,
    pub threshold: f64,
    pub convergence_delta: f64,
    pub cost_ceiling: f64,
    pub personas_per_group: usize,
    pub persona_tier: Tier,
    pub synthesis_tier: Tier,
    pub personas: Vec<FilePersonaConfig>,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        let params = CouncilParams::default();
        Self {
            participants: Vec::new(),
            arbiter: None,
            max_rounds: params.max_rounds,
            threshold: params.threshold,
            convergence_delta: params.convergence_delta,
            cost_ceiling: params.cost_ceiling,
            personas_per_group: params.personas_per_group,
            persona_tier: params.persona_tier,
            synthesis_tier: params.synthesis_tier,
            personas: Vec::new(),
        }
    }
}

/// One reviewer persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePersonaConfig {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub veto: bool,
    #[serde(default)]
    pub directive: String,
}

impl FileCouncilConfig {
    /// Build council parameters, falling back to `default_participants`
    /// when no participants are listed.
    pub fn to_params(&self, default_participants: &[ModelId]) -> CouncilParams {
        let participants = if self.participants.is_empty() {
            default_participants.to_vec()
        } else {
            self.participants
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| ModelId::new(p.trim()))
                .collect()
        };

        let mut params = CouncilParams::default()
            .with_participants(participants)
            .with_max_rounds(self.max_rounds)
            .with_threshold(self.threshold)
            .with_convergence_delta(self.convergence_delta)
            .with_cost_ceiling(self.cost_ceiling);
        params.personas_per_group = self.personas_per_group;
        params.persona_tier = self.persona_tier;
        params.synthesis_tier = self.synthesis_tier;

        if let Some(arbiter) = self.arbiter.as_deref().filter(|a| !a.trim().is_empty()) {
            params = params.with_arbiter(ModelId::new(arbiter.trim()));
        }
        if !self.personas.is_empty() {
            params = params.with_roster(self.personas.iter().map(FilePersonaConfig::to_persona).collect());
        }
        params
    }

    /// Issues only visible before personas are clamped.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for persona in &self.personas {
            if !(0.0..=1.0).contains(&persona.weight) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::PersonaWeightOutOfRange,
                    format!(
                        "council.personas.{}: weight {} will be clamped to [0, 1]",
                        persona.name, persona.weight
                    ),
                ));
            }
        }
        let names = self.participants.iter().chain(&self.arbiter);
        for name in names {
            if name.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName,
                    "council: model name cannot be empty",
                ));
            }
        }
        issues
    }
}

impl FilePersonaConfig {
    pub fn to_persona(&self) -> Persona {
        let persona = Persona::new(&self.name, self.weight).with_directive(&self.directive);
        if self.veto { persona.with_veto() } else { persona }
    }
}
