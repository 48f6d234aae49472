//! Model backend that shells out to an external command.
//!
//! The prompt (prefixed by the system prompt, if any) is written to the
//! command's stdin; stdout is the reply. `{model}` in the arguments is
//! replaced with the requested model id, so one command can serve every
//! configured model:
//!
//! ```toml
//! [models]
//! command = "llm"
//! args = ["-m", "{model}"]
//! ```

use super::{ModelBackend, estimate_tokens};
use async_trait::async_trait;
use conclave_application::{ModelError, ModelReply};
use conclave_domain::ModelId;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

const MODEL_PLACEHOLDER: &str = "{model}";

pub struct CommandModelBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    default_price_per_1k: f64,
    prices: BTreeMap<String, f64>,
}

impl CommandModelBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(120),
            default_price_per_1k: 0.0,
            prices: BTreeMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// USD per 1k tokens, with per-model overrides.
    pub fn with_prices(mut self, default_price_per_1k: f64, prices: BTreeMap<String, f64>) -> Self {
        self.default_price_per_1k = default_price_per_1k;
        self.prices = prices;
        self
    }

    fn args_for(&self, model: &ModelId) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(MODEL_PLACEHOLDER, model.as_str()))
            .collect()
    }

    fn cost(&self, model: &ModelId, input: &str, output: &str) -> f64 {
        let price = self
            .prices
            .get(model.as_str())
            .copied()
            .unwrap_or(self.default_price_per_1k);
        let tokens = estimate_tokens(input) + estimate_tokens(output);
        tokens as f64 / 1000.0 * price
    }

    async fn run(&self, model: &ModelId, input: &str) -> Result<String, ModelError> {
        let mut child = Command::new(&self.program)
            .args(self.args_for(model))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ModelError::ModelNotAvailable(format!("failed to spawn {}: {}", self.program, e))
            })?;

        // Dropping stdin closes the pipe so the command sees EOF. Commands
        // that never read their input may exit first; that is not an error.
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(input.as_bytes()).await
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(ModelError::RequestFailed(format!("write to stdin: {}", e)));
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ModelError::RequestFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl ModelBackend for CommandModelBackend {
    async fn complete(
        &self,
        model: &ModelId,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<ModelReply, ModelError> {
        let input = match system {
            Some(system) => format!("{}\n\n{}", system, prompt),
            None => prompt.to_string(),
        };
        debug!(model = %model, bytes = input.len(), "Invoking model command");

        let content = tokio::time::timeout(self.timeout, self.run(model, &input))
            .await
            .map_err(|_| ModelError::Timeout)??;

        if content.is_empty() {
            return Err(ModelError::RequestFailed(format!(
                "{} returned an empty reply",
                self.program
            )));
        }
        let cost = self.cost(model, &input, &content);
        Ok(ModelReply::new(content, model.clone(), cost))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_stdin_through_cat() {
        let backend = CommandModelBackend::new("cat", vec![])
            .with_prices(1.0, BTreeMap::new());
        let reply = backend
            .complete(&ModelId::new("m"), Some("sys"), "hello")
            .await
            .unwrap();
        assert_eq!(reply.content, "sys\n\nhello");
        assert_eq!(reply.model, ModelId::new("m"));
        assert!(reply.cost > 0.0);
    }

    #[tokio::test]
    async fn test_model_placeholder_in_args() {
        let backend = CommandModelBackend::new("echo", vec!["model={model}".to_string()]);
        let reply = backend
            .complete(&ModelId::new("gpt-5-mini"), None, "ignored")
            .await
            .unwrap();
        assert_eq!(reply.content, "model=gpt-5-mini");
        assert_eq!(reply.cost, 0.0);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_request_failure() {
        let backend = CommandModelBackend::new("false", vec![]);
        let err = backend
            .complete(&ModelId::new("m"), None, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let backend = CommandModelBackend::new("/nonexistent/model-cli", vec![]);
        let err = backend
            .complete(&ModelId::new("m"), None, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ModelNotAvailable(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let backend = CommandModelBackend::new("sleep", vec!["5".to_string()])
            .with_timeout(Duration::from_millis(100));
        let err = backend
            .complete(&ModelId::new("m"), None, "x")
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::Timeout);
    }
}
