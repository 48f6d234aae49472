//! Reasoning strategy selection.

use crate::core::string::words;
use serde::{Deserialize, Serialize};

/// How a reasoning executor works through a task.
///
/// | Strategy | Model calls | Adaptivity |
/// |----------|-------------|------------|
/// | `Iterative` | one per step | high |
/// | `PlanFirst` | plan + optional re-plan + synthesis | medium |
/// | `BatchReasoning` | plan + synthesis | low |
/// | `SelfCritique` | iterative attempts + one reflection each | high |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Iterative,
    PlanFirst,
    BatchReasoning,
    SelfCritique,
}

const SEQUENCING_PHRASES: &[&str] = &[
    "step by step",
    "and then",
    "after that",
    "followed by",
    "once done",
];

const SEQUENCING_WORDS: &[&str] = &["then", "finally", "afterwards", "first", "next"];

const BUILD_VERBS: &[&str] = &[
    "build",
    "create",
    "implement",
    "scaffold",
    "setup",
    "develop",
    "generate",
];

const ANALYTICAL_VERBS: &[&str] = &[
    "analyze",
    "analyse",
    "explain",
    "compare",
    "summarize",
    "summarise",
    "describe",
    "evaluate",
    "assess",
    "investigate",
    "inspect",
    "examine",
    "audit",
    "research",
    "list",
    "find",
];

const EXECUTION_VERBS: &[&str] = &[
    "run",
    "write",
    "create",
    "build",
    "deploy",
    "install",
    "delete",
    "remove",
    "modify",
    "update",
    "implement",
    "refactor",
    "execute",
    "fix",
    "edit",
    "move",
    "rename",
];

const CORRECTION_WORDS: &[&str] = &[
    "fix",
    "correct",
    "debug",
    "repair",
    "careful",
    "carefully",
    "cautious",
    "cautiously",
    "verify",
    "bug",
    "broken",
    "mistake",
    "safely",
];

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Iterative,
        Strategy::PlanFirst,
        Strategy::BatchReasoning,
        Strategy::SelfCritique,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Iterative => "iterative",
            Strategy::PlanFirst => "plan_first",
            Strategy::BatchReasoning => "batch_reasoning",
            Strategy::SelfCritique => "self_critique",
        }
    }

    /// Pick a strategy from the wording of a goal.
    ///
    /// Rules are checked in order: sequencing or compound-build language,
    /// then purely analytical goals, then correction/caution language.
    /// Anything else runs iteratively.
    pub fn select_for(goal: &str) -> Strategy {
        let lower = goal.to_lowercase();
        let tokens = words(&lower);
        let has = |list: &[&str]| tokens.iter().any(|t| list.contains(&t.as_str()));

        let sequencing = SEQUENCING_PHRASES.iter().any(|p| lower.contains(p))
            || has(SEQUENCING_WORDS)
            || lower.contains("set up");
        let compound_build = has(BUILD_VERBS) && tokens.iter().any(|t| t == "and");
        if sequencing || compound_build {
            return Strategy::PlanFirst;
        }

        if has(ANALYTICAL_VERBS) && !has(EXECUTION_VERBS) {
            return Strategy::BatchReasoning;
        }

        if has(CORRECTION_WORDS) {
            return Strategy::SelfCritique;
        }

        Strategy::Iterative
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "iterative" | "default" => Ok(Strategy::Iterative),
            "plan_first" | "plan" => Ok(Strategy::PlanFirst),
            "batch_reasoning" | "batch" => Ok(Strategy::BatchReasoning),
            "self_critique" | "critique" => Ok(Strategy::SelfCritique),
            other => Err(format!(
                "Unknown strategy: {}. Valid: iterative, plan-first, batch, self-critique",
                other
            )),
        }
    }
}
