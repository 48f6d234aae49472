//! Reviewer personas

use serde::{Deserialize, Serialize};

/// A named reviewer role with a voting weight and optional veto authority.
///
/// # Example
///
/// ```
/// use conclave_domain::deliberation::Persona;
///
/// let security = Persona::new("security", 1.0)
///     .with_veto()
///     .with_directive("Reject anything that widens the attack surface.");
/// assert!(security.veto);
///
/// // Weights are clamped into [0, 1]
/// assert_eq!(Persona::new("style", 3.0).weight, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub veto: bool,
    #[serde(default)]
    pub directive: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight: clamp_weight(weight),
            veto: false,
            directive: String::new(),
        }
    }

    pub fn with_veto(mut self) -> Self {
        self.veto = true;
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = directive.into();
        self
    }

    /// Built-in roster used when none is configured.
    pub fn default_roster() -> Vec<Persona> {
        vec![
            Persona::new("security", 1.0)
                .with_veto()
                .with_directive("Look for injection, secret leakage, unsafe file or shell access."),
            Persona::new("correctness", 1.0)
                .with_veto()
                .with_directive("Check logic errors, unhandled edge cases and broken contracts."),
            Persona::new("maintainability", 0.6)
                .with_directive("Judge naming, structure and how easy the change is to evolve."),
            Persona::new("performance", 0.5)
                .with_directive("Flag needless allocation, quadratic loops and blocking calls."),
            Persona::new("clarity", 0.4)
                .with_directive("Judge whether a reader unfamiliar with the code can follow it."),
        ]
    }
}

/// Clamp a weight into `[0, 1]`; NaN becomes 0.
pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}

/// Split a roster into (veto personas, advisory personas), each capped at
/// `per_group`, preserving roster order.
pub fn split_roster(roster: &[Persona], per_group: usize) -> (Vec<&Persona>, Vec<&Persona>) {
    let veto = roster.iter().filter(|p| p.veto).take(per_group).collect();
    let advisory = roster.iter().filter(|p| !p.veto).take(per_group).collect();
    (veto, advisory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_clamp() {
        assert_eq!(Persona::new("a", -1.0).weight, 0.0);
        assert_eq!(Persona::new("a", 0.3).weight, 0.3);
        assert_eq!(clamp_weight(f64::NAN), 0.0);
    }

    #[test]
    fn test_split_roster_caps_groups() {
        let roster = vec![
            Persona::new("v1", 1.0).with_veto(),
            Persona::new("a1", 0.5),
            Persona::new("v2", 1.0).with_veto(),
            Persona::new("v3", 1.0).with_veto(),
            Persona::new("v4", 1.0).with_veto(),
            Persona::new("a2", 0.5),
        ];
        let (veto, advisory) = split_roster(&roster, 3);
        let names: Vec<_> = veto.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["v1", "v2", "v3"]);
        assert_eq!(advisory.len(), 2);
    }

    #[test]
    fn test_default_roster_has_veto_and_advisory() {
        let roster = Persona::default_roster();
        assert!(roster.iter().any(|p| p.veto));
        assert!(roster.iter().any(|p| !p.veto));
    }

    #[test]
    fn test_persona_from_toml_defaults() {
        let persona: Persona = toml::from_str("name = \"ops\"\nweight = 0.7").unwrap();
        assert!(!persona.veto);
        assert!(persona.directive.is_empty());
    }
}
