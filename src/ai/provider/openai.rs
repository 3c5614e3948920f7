//! OpenAI API Provider
//!
//! Chat Completions API (or any compatible endpoint via `api_base`).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{
    LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, SynthesisRequest,
    TokenUsage,
};
use crate::types::{ErrorClassifier, Result, WikiError};

const PROVIDER_NAME: &str = "openai";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                WikiError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var".to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WikiError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, request: &SynthesisRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<LlmResponse> {
        debug!(
            model = %self.model,
            prompt_chars = request.char_len(),
            "Sending request to OpenAI API"
        );

        let start_time = Instant::now();
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WikiError::Llm(ErrorClassifier::classify("request timed out", PROVIDER_NAME))
                } else {
                    WikiError::LlmApi(format!("OpenAI connection failed: {}", e))
                }
            })?;

        let elapsed = start_time.elapsed();

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WikiError::Llm(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("OpenAI API error ({}): {}", status, body),
                PROVIDER_NAME,
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| WikiError::LlmApi(format!("Failed to parse OpenAI response: {}", e)))?;

        let usage = body
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| WikiError::LlmApi("Empty response from OpenAI".to_string()))?;

        Ok(LlmResponse {
            content,
            usage,
            cost_usd: 0.0,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER_NAME.to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.api_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("OpenAI API is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("OpenAI API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("OpenAI API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(ProviderConfig {
            provider: "openai".to_string(),
            model: None,
            api_key: Some("sk-test".to_string()),
            api_base: Some("http://localhost:9999/v1/".to_string()),
            ..ProviderConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_carries_both_contexts() {
        let provider = provider();
        let request = provider.build_request(&SynthesisRequest::new("sys", "usr"));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "sys");
        assert_eq!(json["messages"][1]["content"], "usr");
        assert_eq!(provider.api_base, "http://localhost:9999/v1");
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("sk-test"));
    }

    #[test]
    fn test_parse_response_body() {
        let body: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "content": "# Doc" } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 3 }
        }))
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("# Doc"));
        assert_eq!(body.usage.unwrap().prompt_tokens, 12);
    }
}
