//! Ollama Local LLM Provider
//!
//! Uses `/api/generate` with streaming disabled. Token counts come from the
//! `prompt_eval_count`/`eval_count` fields when Ollama reports them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{
    LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, SynthesisRequest,
    TokenUsage,
};
use crate::types::{ErrorClassifier, Result, WikiError};

const PROVIDER_NAME: &str = "ollama";
const DEFAULT_API_BASE: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3:latest";

/// Ollama Local LLM Provider
pub struct OllamaProvider {
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Self::validate_endpoint(&api_base)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WikiError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    /// Only http/https endpoints are accepted; remote hosts are allowed with
    /// a warning.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            WikiError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(WikiError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "[::1]")
        {
            warn!(host, "Ollama endpoint is not localhost");
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    fn build_request(&self, request: &SynthesisRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            system: request.system.clone(),
            prompt: request.user.clone(),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<LlmResponse> {
        debug!(
            model = %self.model,
            prompt_chars = request.char_len(),
            "Sending request to Ollama"
        );

        let start_time = Instant::now();
        let url = format!("{}/api/generate", self.api_base);

        let response = self
            .client
            .post(&url)
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    WikiError::LlmApi(format!(
                        "Connection to Ollama at {} failed. Start it with: ollama serve",
                        self.api_base
                    ))
                } else if e.is_timeout() {
                    WikiError::LlmApi(format!("Ollama request timed out: {}", e))
                } else {
                    WikiError::LlmApi(format!("Ollama request failed: {}", e))
                }
            })?;

        let elapsed = start_time.elapsed();

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WikiError::Llm(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Ollama API error ({}): {}", status, body),
                PROVIDER_NAME,
            )));
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| WikiError::LlmApi(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(LlmResponse {
            content: body.response,
            usage: TokenUsage::new(
                body.prompt_eval_count.unwrap_or(0),
                body.eval_count.unwrap_or(0),
            ),
            // Local model
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
        let url = format!("{}/api/tags", self.api_base);

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let Ok(tags) = resp.json::<OllamaTagsResponse>().await else {
                    info!("Ollama is available");
                    return Ok(true);
                };
                let base = self.model.trim_end_matches(":latest");
                if tags
                    .models
                    .iter()
                    .any(|m| m.name == self.model || m.name.starts_with(base))
                {
                    info!(model = %self.model, "Ollama is available");
                    Ok(true)
                } else {
                    warn!(
                        "Ollama is running but model '{}' not found. Pull with: ollama pull {}",
                        self.model, self.model
                    );
                    Ok(false)
                }
            }
            Ok(resp) => {
                warn!("Ollama API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Ollama not available: {}. Start with: ollama serve", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}
