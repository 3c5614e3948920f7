//! AI Integration Layer
//!
//! Text synthesis through interchangeable LLM providers, wrapped with
//! per-call timeouts and bounded retry.

pub mod call;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use call::{CallSettings, SynthesisClient};
pub use prompt::{PromptBuilder, PromptSection};
pub use provider::{
    ClaudeCodeProvider, LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider, ProviderConfig,
    ResponseMetadata, ResponseTiming, SharedProvider, SynthesisRequest, TokenUsage,
    create_provider,
};
pub use timeout::{with_timeout, with_timeout_map};
