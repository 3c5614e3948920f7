//! Claude Code CLI Provider
//!
//! Runs `claude -p --output-format json` with the user context on stdin and
//! the system context passed via `--system-prompt`. Single-shot; the caller
//! owns retries.

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::{
    LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, SynthesisRequest,
    TokenUsage,
};
use crate::types::{Result, WikiError};

const PROVIDER_NAME: &str = "claude-code";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Claude Code CLI Provider
pub struct ClaudeCodeProvider {
    model: String,
    timeout_secs: u64,
    temperature: f32,
}

impl ClaudeCodeProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs: config.timeout_secs,
            temperature: config.temperature,
        }
    }

    async fn execute(&self, request: &SynthesisRequest) -> Result<LlmResponse> {
        let start_time = Instant::now();

        debug!(
            model = %self.model,
            prompt_chars = request.char_len(),
            "Executing Claude Code CLI"
        );

        // Large prompts exceed the argv limit, so the user context goes on stdin
        let mut child = Command::new("claude")
            .arg("-p")
            .arg("--output-format")
            .arg("json")
            .arg("--model")
            .arg(&self.model)
            .arg("--system-prompt")
            .arg(&request.system)
            .env("CLAUDE_CODE_TEMPERATURE", self.temperature.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WikiError::LlmApi(format!(
                    "Failed to spawn Claude Code CLI: {}. Is it installed?",
                    e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.user.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            WikiError::LlmApi(format!(
                "Claude Code timed out after {}s",
                self.timeout_secs
            ))
        })?
        .map_err(|e| WikiError::LlmApi(format!("Claude Code execution failed: {}", e)))?;

        let elapsed = start_time.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            if let Ok(response) = serde_json::from_str::<Value>(&stdout)
                && response
                    .get("is_error")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            {
                let message = response
                    .get("result")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown API error");
                return Err(WikiError::LlmApi(format!(
                    "Claude Code API error: {}",
                    message
                )));
            }

            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                "Process exited with non-zero status"
            } else {
                stderr.trim()
            };
            return Err(WikiError::LlmApi(format!("Claude Code failed: {}", message)));
        }

        let response: Value = serde_json::from_str(&stdout).map_err(|e| {
            WikiError::LlmApi(format!("Failed to parse Claude Code output: {}", e))
        })?;

        let content = extract_result(&response)?;
        let api_ms = response.get("duration_api_ms").and_then(Value::as_u64);

        Ok(LlmResponse {
            content,
            usage: extract_usage(&response),
            cost_usd: extract_cost(&response),
            timing: ResponseTiming {
                total_ms: elapsed.as_millis() as u64,
                api_ms,
            },
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER_NAME.to_string(),
            },
        })
    }
}

fn extract_result(response: &Value) -> Result<String> {
    match response.get("result") {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) if !other.is_null() => Ok(other.to_string()),
        _ => Err(WikiError::LlmApi(
            "Empty response: no result in Claude Code output".to_string(),
        )),
    }
}

fn extract_usage(response: &Value) -> TokenUsage {
    let usage = response.get("usage");
    let field = |name: &str| {
        usage
            .and_then(|u| u.get(name))
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32
    };
    TokenUsage::new(field("input_tokens"), field("output_tokens"))
}

fn extract_cost(response: &Value) -> f64 {
    response
        .get("total_cost_usd")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

#[async_trait]
impl LlmProvider for ClaudeCodeProvider {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<LlmResponse> {
        self.execute(request).await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let output = Command::new("claude")
            .arg("--version")
            .output()
            .await
            .map_err(|e| WikiError::LlmApi(format!("Claude Code not installed: {}", e)))?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout);
            info!("Claude Code CLI available: {}", version.trim());
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires claude CLI installed"]
    async fn test_health_check() {
        let provider = ClaudeCodeProvider::new(ProviderConfig::default());
        assert!(provider.health_check().await.is_ok());
    }

    #[test]
    fn test_extract_result_text() {
        let response = serde_json::json!({ "result": "# Title\n\nBody" });
        assert_eq!(extract_result(&response).unwrap(), "# Title\n\nBody");
        assert!(extract_result(&serde_json::json!({ "result": null })).is_err());
        assert!(extract_result(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_extract_usage_and_cost() {
        let response = serde_json::json!({
            "total_cost_usd": 0.0471472,
            "usage": { "input_tokens": 1000, "output_tokens": 500 }
        });
        assert_eq!(extract_usage(&response).total(), 1500);
        assert!((extract_cost(&response) - 0.0471472).abs() < 1e-7);
        assert_eq!(extract_cost(&serde_json::json!({})), 0.0);
    }

    #[test]
    fn test_model_falls_back_to_default() {
        let provider = ClaudeCodeProvider::new(ProviderConfig {
            model: None,
            ..ProviderConfig::default()
        });
        assert_eq!(provider.model(), DEFAULT_MODEL);
    }
}
