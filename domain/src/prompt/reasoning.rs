//! Prompt templates for the reasoning strategies

use crate::reasoning::action::TOOL_NAMES;
use crate::task::Task;

/// Templates for reasoning executor prompts
pub struct ReasoningPromptTemplate;

impl ReasoningPromptTemplate {
    /// Tool list shown to the model, restricted to the toolbox's capabilities.
    pub fn tool_list(capabilities: &[&str]) -> String {
        TOOL_NAMES
            .iter()
            .filter(|t| **t == "finish" || capabilities.contains(*t))
            .map(|t| format!("- {}", tool_usage(t)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// System prompt shared by every reasoning call
    pub fn system(capabilities: &[&str]) -> String {
        format!(
            r#"You are an autonomous agent that solves tasks by reasoning and using tools.

## Available Tools

{tools}

Write every tool call on one line as `tool[argument]`.
"#,
            tools = Self::tool_list(capabilities)
        )
    }

    /// Next-step prompt for the iterative loop
    pub fn next_step(task: &Task, transcript: &str) -> String {
        let history = if transcript.is_empty() {
            "(no steps yet)".to_string()
        } else {
            transcript.to_string()
        };
        format!(
            r#"## Task

{goal}

## Progress So Far

{history}

Respond with exactly one of:

Thought: <your reasoning>
Action: <tool[argument]>

or, when the task is complete:

Thought: <your reasoning>
Final Answer: <the answer>
"#,
            goal = task.goal(),
            history = history
        )
    }

    /// Plan prompt for the plan-first strategy
    pub fn plan(task: &Task) -> String {
        format!(
            r#"## Task

{goal}

Write a numbered list of tool calls that accomplishes the task, one per line:

1. tool[argument]
2. tool[argument]

Do not include the final answer; it is written after the plan runs.
"#,
            goal = task.goal()
        )
    }

    /// Re-plan prompt after a failed plan step
    pub fn replan(task: &Task, transcript: &str, remaining: &[String]) -> String {
        let remaining = if remaining.is_empty() {
            "(none)".to_string()
        } else {
            remaining.join("\n")
        };
        format!(
            r#"## Task

{goal}

## Executed Steps

{transcript}

The last step failed. The steps that were still planned:

{remaining}

Write a new numbered list of tool calls to replace the remaining steps.
"#,
            goal = task.goal(),
            transcript = transcript,
            remaining = remaining
        )
    }

    /// Placeholder plan prompt for the batch strategy
    pub fn batch_plan(task: &Task) -> String {
        format!(
            r#"## Task

{goal}

Write the complete plan up front. Label each tool call `#E1`, `#E2`, ...
and refer to an earlier call's output by its label:

Plan: <why this call>
#E1 = tool[argument]
Plan: <why this call>
#E2 = tool[argument that may mention #E1]
"#,
            goal = task.goal()
        )
    }

    /// Synthesis prompt over collected outputs
    pub fn synthesize(task: &Task, evidence: &str) -> String {
        format!(
            r#"## Task

{goal}

## Evidence

{evidence}

Using only the evidence above, write the final answer to the task.
"#,
            goal = task.goal(),
            evidence = evidence
        )
    }

    /// Reflection prompt after a self-critique attempt
    pub fn reflect(task: &Task, transcript: &str, answer: Option<&str>) -> String {
        format!(
            r#"## Task

{goal}

## Attempt

{transcript}

## Answer

{answer}

Did the attempt fully accomplish the task? Start your reply with SUCCESS or
FAILURE. On FAILURE, list what to do differently as `- ` bullet points.
"#,
            goal = task.goal(),
            transcript = transcript,
            answer = answer.unwrap_or("(no answer produced)")
        )
    }

    /// Last-resort direct question after every strategy failed
    pub fn direct(task: &Task, transcript: &str) -> String {
        let context = if transcript.is_empty() {
            String::new()
        } else {
            format!("\n## Notes From Earlier Attempts\n\n{}\n", transcript)
        };
        format!(
            r#"Answer the following task as well as you can, without tools.

## Task

{goal}
{context}"#,
            goal = task.goal(),
            context = context
        )
    }
}

fn tool_usage(tool: &str) -> &'static str {
    match tool {
        "read_file" => "read_file[path]: read a file",
        "write_file" => "write_file[path | content]: write a file inside the working directory",
        "list_dir" => "list_dir[path]: list a directory",
        "shell" => "shell[command]: run a shell command",
        "search" => "search[query]: search stored notes",
        "review" => "review[artifact]: ask the review council to vote on an artifact",
        _ => "finish[answer]: finish with the final answer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_list_filters_capabilities() {
        let list = ReasoningPromptTemplate::tool_list(&["read_file", "shell"]);
        assert!(list.contains("read_file[path]"));
        assert!(list.contains("shell[command]"));
        assert!(list.contains("finish[answer]"));
        assert!(!list.contains("write_file"));
    }

    #[test]
    fn test_next_step_includes_history() {
        let task = Task::new("count the files");
        let prompt = ReasoningPromptTemplate::next_step(&task, "");
        assert!(prompt.contains("count the files"));
        assert!(prompt.contains("(no steps yet)"));

        let prompt = ReasoningPromptTemplate::next_step(&task, "Action: ls[.]");
        assert!(prompt.contains("Action: ls[.]"));
    }

    #[test]
    fn test_reflect_without_answer() {
        let prompt = ReasoningPromptTemplate::reflect(&Task::new("x"), "log", None);
        assert!(prompt.contains("(no answer produced)"));
        assert!(prompt.contains("SUCCESS or\nFAILURE"));
    }
}
