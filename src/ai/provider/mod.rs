//! LLM Provider Abstraction
//!
//! Defines the [`LlmProvider`] trait used for all text synthesis. A provider
//! turns a system context plus a user context into markdown text and reports
//! token usage. Providers are single-shot: timeouts and retries live in
//! [`crate::ai::call`].

mod claude_code;
mod ollama;
mod openai;
#[cfg(test)]
pub(crate) mod testing;

pub use claude_code::ClaudeCodeProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::types::{Result, WikiError};

// =============================================================================
// Request / Response
// =============================================================================

/// One synthesis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub system: String,
    pub user: String,
}

impl SynthesisRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Total prompt size in characters
    pub fn char_len(&self) -> usize {
        self.system.chars().count() + self.user.chars().count()
    }
}

/// Generated text plus usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: TokenUsage,
    /// Cost in USD when the provider reports it
    pub cost_usd: f64,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Response with content only (usage unknown)
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            cost_usd: 0.0,
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Wall clock time in milliseconds
    pub total_ms: u64,
    /// Processing time reported by the provider
    pub api_ms: Option<u64>,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
            api_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Shared provider handle for concurrent generation tasks
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Settings handed to a provider constructor.
///
/// The API key is never serialized and is redacted from debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "claude-code", "openai" or "ollama"
    pub provider: String,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for ProviderConfig {
    fn from(llm: &LlmConfig) -> Self {
        Self {
            provider: llm.provider.clone(),
            model: Some(llm.model.clone()).filter(|m| !m.is_empty()),
            timeout_secs: llm.timeout_secs,
            temperature: llm.temperature,
            api_key: None,
            api_base: llm.api_base.clone(),
            max_tokens: llm.max_tokens,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Produce text for the given system and user context
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "claude-code" => Ok(Arc::new(ClaudeCodeProvider::new(config.clone()))),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        _ => Err(WikiError::Config(format!(
            "Unknown provider: {}. Supported: claude-code, openai, ollama",
            config.provider
        ))),
    }
}
