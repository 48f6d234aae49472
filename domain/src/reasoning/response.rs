//! Parsing of free-form model output for the reasoning strategies.
//!
//! Every parser here is lenient: malformed output degrades to an empty or
//! default value and the caller decides how to proceed.

use crate::core::string::truncate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The parts of one iterative step response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepResponse {
    pub thought: String,
    pub action: Option<String>,
    pub final_answer: Option<String>,
}

/// Parse a `Thought: ... / Action: ... / Final Answer: ...` response.
///
/// `Final Answer:` takes everything after the label, across lines. A
/// response with neither label is treated as a bare thought.
pub fn parse_step_response(response: &str) -> StepResponse {
    let mut parsed = StepResponse::default();
    let mut thought_lines: Vec<&str> = Vec::new();
    let mut in_thought = false;

    let lines: Vec<&str> = response.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();

        if lower.starts_with("final answer:") {
            let first = trimmed["final answer:".len()..].trim();
            let mut answer = vec![first];
            answer.extend(lines[i + 1..].iter().copied());
            parsed.final_answer = Some(answer.join("\n").trim().to_string());
            break;
        }
        if lower.starts_with("action:") {
            in_thought = false;
            if parsed.action.is_none() {
                let action = trimmed["action:".len()..].trim();
                if !action.is_empty() {
                    parsed.action = Some(action.to_string());
                }
            }
            continue;
        }
        if lower.starts_with("thought:") {
            in_thought = true;
            thought_lines.push(trimmed["thought:".len()..].trim());
            continue;
        }
        if in_thought {
            thought_lines.push(trimmed);
        }
    }

    parsed.thought = thought_lines.join(" ").trim().to_string();
    if parsed.thought.is_empty() && parsed.action.is_none() && parsed.final_answer.is_none() {
        parsed.thought = response.trim().to_string();
    }
    parsed
}

/// Parse a numbered plan (`1. step`, `2) step`) into action lines.
///
/// An `Action:` label and backticks around each item are stripped.
pub fn parse_numbered_plan(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                return None;
            }
            let rest = &line[digits..];
            let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
            let mut item = rest.trim();
            if item.len() >= 7
                && item.is_char_boundary(7)
                && item[..7].eq_ignore_ascii_case("action:")
            {
                item = item[7..].trim();
            }
            let item = item.trim_matches('`').trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}

/// One line of a placeholder plan: `#E2 = shell[wc -l #E1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub label: String,
    pub action: String,
}

/// Parse a placeholder plan. Lines without a `#E<n> =` label are ignored.
pub fn parse_batch_plan(response: &str) -> Vec<PlannedAction> {
    response
        .lines()
        .filter_map(|line| {
            let start = line.find("#E")?;
            let after = &line[start + 2..];
            let digits = after.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                return None;
            }
            let label = format!("#E{}", &after[..digits]);
            let rest = after[digits..].trim_start();
            let action = rest.strip_prefix('=')?.trim().trim_matches('`').trim();
            (!action.is_empty()).then(|| PlannedAction {
                label,
                action: action.to_string(),
            })
        })
        .collect()
}

/// Replace `#E<n>` placeholders with earlier outputs.
///
/// Longer labels are substituted first so `#E10` is not clobbered by `#E1`.
/// Outputs are truncated to keep the resulting action line manageable.
pub fn substitute_placeholders(action: &str, outputs: &BTreeMap<String, String>) -> String {
    let mut labels: Vec<&String> = outputs.keys().collect();
    labels.sort_by_key(|l| std::cmp::Reverse(l.len()));

    let mut result = action.to_string();
    for label in labels {
        if result.contains(label.as_str()) {
            let value = truncate(outputs[label].trim(), 2000);
            result = result.replace(label.as_str(), &value);
        }
    }
    result
}

/// Verdict of a reflection call on one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub success: bool,
    pub lessons: Vec<String>,
}

/// Parse a reflection response looking for SUCCESS/FAILURE plus lessons.
///
/// Conservative: without an unqualified SUCCESS the attempt counts as a
/// failure. Lessons are the bullet lines of the response; a failed
/// reflection with no bullets keeps the whole text as one lesson.
pub fn parse_reflection(response: &str) -> Reflection {
    let upper = response.to_uppercase();
    let success =
        upper.contains("SUCCESS") && !upper.contains("FAILURE") && !upper.contains("PARTIAL");

    let mut lessons: Vec<String> = response
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(|l| l.trim().to_string())
        })
        .filter(|l| !l.is_empty())
        .collect();

    if lessons.is_empty() && !success && !response.trim().is_empty() {
        lessons.push(truncate(response.trim(), 300));
    }

    Reflection { success, lessons }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step_with_action() {
        let parsed = parse_step_response(
            "Thought: I should look at the files\nfirst.\nAction: ls[.]\nObservation: ignored",
        );
        assert_eq!(parsed.thought, "I should look at the files first.");
        assert_eq!(parsed.action.as_deref(), Some("ls[.]"));
        assert!(parsed.final_answer.is_none());
    }

    #[test]
    fn test_parse_step_final_answer_multiline() {
        let parsed = parse_step_response("Thought: done\nFinal Answer: line one\nline two");
        assert_eq!(parsed.final_answer.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn test_parse_step_malformed_is_thought() {
        let parsed = parse_step_response("I am not sure what to do");
        assert_eq!(parsed.thought, "I am not sure what to do");
        assert!(parsed.action.is_none());
    }

    #[test]
    fn test_parse_numbered_plan() {
        let plan = parse_numbered_plan(
            "Here is the plan:\n1. read_file[Cargo.toml]\n2) Action: `shell[cargo tree]`\n\n3.\nnot a step",
        );
        assert_eq!(plan, vec!["read_file[Cargo.toml]", "shell[cargo tree]"]);
    }

    #[test]
    fn test_parse_batch_plan() {
        let plan = parse_batch_plan(
            "Plan: find files\n#E1 = shell[ls src]\nPlan: count\n#E2 = shell[wc -l #E1]\n#E3 broken",
        );
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].label, "#E2");
        assert_eq!(plan[1].action, "shell[wc -l #E1]");
    }

    #[test]
    fn test_substitute_placeholders_longest_first() {
        let mut outputs = BTreeMap::new();
        outputs.insert("#E1".to_string(), "one".to_string());
        outputs.insert("#E10".to_string(), "ten".to_string());
        assert_eq!(
            substitute_placeholders("echo #E10 #E1", &outputs),
            "echo ten one"
        );
    }

    #[test]
    fn test_parse_reflection() {
        let ok = parse_reflection("SUCCESS\nThe answer is complete.");
        assert!(ok.success);

        let failed = parse_reflection("FAILURE\n- check the config path\n* run tests first");
        assert!(!failed.success);
        assert_eq!(
            failed.lessons,
            vec!["check the config path", "run tests first"]
        );

        let vague = parse_reflection("It did not work because the file was missing");
        assert!(!vague.success);
        assert_eq!(vague.lessons.len(), 1);
    }
}
