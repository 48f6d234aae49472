//! Tool actions emitted by the model.
//!
//! Models write one action per line as `tool[argument]`. [`Action::parse`]
//! turns that line into a tagged union so dispatch is an exhaustive `match`
//! instead of string comparison.
//!
//! | Tool | Aliases | Argument |
//! |------|---------|----------|
//! | `read_file` | `read`, `cat` | path |
//! | `write_file` | `write` | `path \| content` |
//! | `list_dir` | `ls`, `list` | path |
//! | `shell` | `run`, `bash`, `sh`, `exec` | command line |
//! | `search` | `memory_search`, `grep` | query |
//! | `review` | `deliberate` | artifact text |
//! | `finish` | `final_answer`, `answer`, `done` | answer |

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum Action {
    ReadFile { path: String },
    WriteFile { path: String, content: String },
    ListDir { path: String },
    Shell { command: String },
    Search { query: String },
    Review { artifact: String },
    Finish { answer: String },
}

impl Action {
    /// Parse a `tool[argument]` action line.
    ///
    /// A leading `Action:` label and surrounding backticks are ignored.
    /// A bare `finish` without brackets is accepted as an empty answer.
    pub fn parse(text: &str) -> Result<Action, DomainError> {
        let mut line = text.trim();
        if let Some(rest) = strip_prefix_ignore_case(line, "action:") {
            line = rest.trim();
        }
        let line = line.trim_matches('`').trim();
        if line.is_empty() {
            return Err(DomainError::InvalidAction("empty action".to_string()));
        }

        let (name, argument) = match line.find('[') {
            Some(open) => {
                let name = &line[..open];
                let rest = &line[open + 1..];
                let argument = match rest.rfind(']') {
                    Some(close) => &rest[..close],
                    None => rest,
                };
                (name.trim(), argument.trim())
            }
            None => (line, ""),
        };

        let name = name.to_lowercase();
        if argument.is_empty() && !is_finish_name(&name) {
            return Err(DomainError::InvalidAction(format!(
                "{} requires an argument in brackets",
                name
            )));
        }

        let action = match name.as_str() {
            "read_file" | "read" | "cat" => Action::ReadFile {
                path: argument.to_string(),
            },
            "write_file" | "write" => {
                let (path, content) = argument.split_once('|').ok_or_else(|| {
                    DomainError::InvalidAction(
                        "write_file expects `path | content`".to_string(),
                    )
                })?;
                let path = path.trim();
                if path.is_empty() {
                    return Err(DomainError::InvalidAction(
                        "write_file path is empty".to_string(),
                    ));
                }
                Action::WriteFile {
                    path: path.to_string(),
                    content: content.strip_prefix(' ').unwrap_or(content).to_string(),
                }
            }
            "list_dir" | "ls" | "list" => Action::ListDir {
                path: argument.to_string(),
            },
            "shell" | "run" | "bash" | "sh" | "exec" => Action::Shell {
                command: argument.to_string(),
            },
            "search" | "memory_search" | "grep" => Action::Search {
                query: argument.to_string(),
            },
            "review" | "deliberate" => Action::Review {
                artifact: argument.to_string(),
            },
            n if is_finish_name(n) => Action::Finish {
                answer: argument.to_string(),
            },
            other => return Err(DomainError::UnknownTool(other.to_string())),
        };
        Ok(action)
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            Action::ReadFile { .. } => "read_file",
            Action::WriteFile { .. } => "write_file",
            Action::ListDir { .. } => "list_dir",
            Action::Shell { .. } => "shell",
            Action::Search { .. } => "search",
            Action::Review { .. } => "review",
            Action::Finish { .. } => "finish",
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, Action::Finish { .. })
    }

    /// Whether the action can change state outside the process.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Action::WriteFile { .. } | Action::Shell { .. })
    }

    /// The raw argument text, used for deny-list matching.
    pub fn argument(&self) -> String {
        match self {
            Action::ReadFile { path } | Action::ListDir { path } => path.clone(),
            Action::WriteFile { path, content } => format!("{} | {}", path, content),
            Action::Shell { command } => command.clone(),
            Action::Search { query } => query.clone(),
            Action::Review { artifact } => artifact.clone(),
            Action::Finish { answer } => answer.clone(),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.tool_name(), self.argument())
    }
}

/// Names of the tools a capability list can advertise to the model.
pub const TOOL_NAMES: [&str; 7] = [
    "read_file",
    "write_file",
    "list_dir",
    "shell",
    "search",
    "review",
    "finish",
];

fn is_finish_name(name: &str) -> bool {
    matches!(name, "finish" | "final_answer" | "answer" | "done")
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_tools() {
        assert_eq!(
            Action::parse("read_file[src/main.rs]").unwrap(),
            Action::ReadFile {
                path: "src/main.rs".to_string()
            }
        );
        assert_eq!(
            Action::parse("Action: shell[cargo --version]").unwrap(),
            Action::Shell {
                command: "cargo --version".to_string()
            }
        );
        assert_eq!(
            Action::parse("`ls[.]`").unwrap(),
            Action::ListDir {
                path: ".".to_string()
            }
        );
    }

    #[test]
    fn test_parse_write_file() {
        let action = Action::parse("write_file[notes.md | # Title\nbody]").unwrap();
        assert_eq!(
            action,
            Action::WriteFile {
                path: "notes.md".to_string(),
                content: "# Title\nbody".to_string()
            }
        );
        assert!(Action::parse("write_file[notes.md]").is_err());
    }

    #[test]
    fn test_parse_nested_brackets_keeps_inner() {
        let action = Action::parse("shell[echo [a] [b]]").unwrap();
        assert_eq!(action.argument(), "echo [a] [b]");
    }

    #[test]
    fn test_parse_finish_variants() {
        assert_eq!(
            Action::parse("finish[42]").unwrap(),
            Action::Finish {
                answer: "42".to_string()
            }
        );
        assert!(Action::parse("done").unwrap().is_finish());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Action::parse("teleport[mars]"),
            Err(DomainError::UnknownTool(t)) if t == "teleport"
        ));
        assert!(matches!(
            Action::parse("shell[]"),
            Err(DomainError::InvalidAction(_))
        ));
        assert!(Action::parse("   ").is_err());
    }

    #[test]
    fn test_display_and_flags() {
        let action = Action::Search {
            query: "retry policy".to_string(),
        };
        assert_eq!(action.to_string(), "search[retry policy]");
        assert!(!action.is_mutating());
        assert!(
            Action::Shell {
                command: "ls".to_string()
            }
            .is_mutating()
        );
    }
}
