//! Local toolbox for reasoning agents
//!
//! [`LocalToolbox`] implements the [`Toolbox`] port on the local machine:
//!
//! | Tool | Implementation |
//! |------|----------------|
//! | `read_file`, `write_file`, `list_dir` | [`file`] |
//! | `shell` | [`command`] (timeout, output cap) |
//! | `search` | [`search`] over the notes directory, if configured |
//! | `review` | the council, through an [`ArtifactReviewer`], if configured |
//!
//! Safety checks happen in the executor before dispatch.

pub mod command;
pub mod file;
pub mod search;

use async_trait::async_trait;
use conclave_application::{ArtifactReviewer, Toolbox};
use conclave_domain::{Action, Observation};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Cut `text` to at most `max` bytes on a char boundary.
pub fn truncate_output(mut text: String, max: usize) -> String {
    if text.len() <= max {
        return text;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("\n... (output truncated)");
    text
}

pub struct LocalToolbox {
    working_dir: PathBuf,
    notes_dir: Option<PathBuf>,
    shell_timeout: Duration,
    max_output: usize,
    reviewer: Option<Arc<dyn ArtifactReviewer>>,
}

impl LocalToolbox {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            notes_dir: None,
            shell_timeout: Duration::from_secs(60),
            max_output: 64 * 1024,
            reviewer: None,
        }
    }

    pub fn with_notes_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.notes_dir = Some(dir.into());
        self
    }

    pub fn with_shell_timeout(mut self, timeout: Duration) -> Self {
        self.shell_timeout = timeout;
        self
    }

    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.max_output = bytes;
        self
    }

    pub fn with_reviewer(mut self, reviewer: Arc<dyn ArtifactReviewer>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    async fn search(&self, query: &str) -> Observation {
        let Some(dir) = self.notes_dir.clone() else {
            return Observation::error("search is not configured (no notes directory)");
        };
        let query = query.to_string();
        match tokio::task::spawn_blocking(move || search::search_notes(&dir, &query)).await {
            Ok(obs) => obs,
            Err(e) => Observation::error(format!("search task failed: {}", e)),
        }
    }

    async fn review(&self, artifact: &str) -> Observation {
        let Some(reviewer) = &self.reviewer else {
            return Observation::error("review is not configured");
        };
        match reviewer.review_artifact(artifact).await {
            Ok(outcome) if outcome.passed => Observation::ok(format!("Review {}", outcome.summary())),
            Ok(outcome) => Observation::error(format!("review {}", outcome.summary())),
            Err(e) => Observation::error(format!("review failed: {}", e)),
        }
    }
}

#[async_trait]
impl Toolbox for LocalToolbox {
    fn capabilities(&self) -> Vec<&'static str> {
        let mut tools = vec!["read_file", "write_file", "list_dir", "shell"];
        if self.notes_dir.is_some() {
            tools.push("search");
        }
        if self.reviewer.is_some() {
            tools.push("review");
        }
        tools
    }

    async fn dispatch(&self, action: &Action) -> Observation {
        debug!(tool = action.tool_name(), "Dispatching action");
        match action {
            Action::ReadFile { path } => file::read_file(&self.working_dir, path, self.max_output).await,
            Action::WriteFile { path, content } => {
                file::write_file(&self.working_dir, path, content).await
            }
            Action::ListDir { path } => file::list_dir(&self.working_dir, path).await,
            Action::Shell { command } => {
                command::run_shell(&self.working_dir, command, self.shell_timeout, self.max_output)
                    .await
            }
            Action::Search { query } => self.search(query).await,
            Action::Review { artifact } => self.review(artifact).await,
            Action::Finish { answer } => Observation::ok(answer.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_application::DeliberationError;
    use conclave_domain::{DeliberationOutcome, Proposal};

    struct PassingReviewer;

    #[async_trait]
    impl ArtifactReviewer for PassingReviewer {
        async fn review_artifact(
            &self,
            artifact: &str,
        ) -> Result<DeliberationOutcome, DeliberationError> {
            if artifact.is_empty() {
                return Err(DeliberationError::EmptyArtifact);
            }
            Ok(DeliberationOutcome::auto_pass(
                Proposal::new("test", artifact, 1),
                0.0,
            ))
        }
    }

    #[test]
    fn test_truncate_output_respects_char_boundary() {
        assert_eq!(truncate_output("short".to_string(), 10), "short");
        let cut = truncate_output("ééé".to_string(), 3);
        assert_eq!(cut, "é\n... (output truncated)");
    }

    #[test]
    fn test_capabilities_follow_configuration() {
        let plain = LocalToolbox::new(".");
        assert_eq!(plain.capabilities(), vec!["read_file", "write_file", "list_dir", "shell"]);

        let full = LocalToolbox::new(".")
            .with_notes_dir("/notes")
            .with_reviewer(Arc::new(PassingReviewer));
        assert!(full.capabilities().contains(&"search"));
        assert!(full.capabilities().contains(&"review"));
    }

    #[tokio::test]
    async fn test_dispatch_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let toolbox = LocalToolbox::new(dir.path());

        let write = Action::parse("write_file[notes.txt | remember me]").unwrap();
        assert!(!toolbox.dispatch(&write).await.is_failure());

        let read = Action::parse("read_file[notes.txt]").unwrap();
        assert_eq!(toolbox.dispatch(&read).await.text, "remember me");
    }

    #[tokio::test]
    async fn test_unconfigured_search_and_review_are_errors() {
        let toolbox = LocalToolbox::new(".");
        let search = toolbox.dispatch(&Action::parse("search[x]").unwrap()).await;
        assert!(search.is_error);
        let review = toolbox.dispatch(&Action::parse("review[x]").unwrap()).await;
        assert!(review.is_error);
    }

    #[tokio::test]
    async fn test_review_through_council() {
        let toolbox = LocalToolbox::new(".").with_reviewer(Arc::new(PassingReviewer));
        let obs = toolbox
            .dispatch(&Action::parse("review[fn main() {}]").unwrap())
            .await;
        assert!(!obs.is_failure());
        assert!(obs.text.starts_with("Review passed"));
    }

    #[tokio::test]
    async fn test_search_notes_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "the deploy key rotates monthly\n").unwrap();
        let toolbox = LocalToolbox::new(".").with_notes_dir(dir.path());

        let obs = toolbox
            .dispatch(&Action::parse("search[deploy key]").unwrap())
            .await;
        assert_eq!(obs.text, "a.md:1: the deploy key rotates monthly");
    }
}
