//! Synthesis calls with per-attempt timeout and bounded retry.
//!
//! Every failure is classified into an [`LlmError`]; only retryable
//! categories are retried, with exponential backoff and jitter. An optional
//! admission gate is held for one attempt at a time, never across backoff.

use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::provider::{LlmResponse, SharedProvider, SynthesisRequest};
use super::timeout::with_timeout;
use crate::config::LlmConfig;
use crate::constants::network;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

/// Timeout and retry settings for synthesis calls
#[derive(Debug, Clone, Copy)]
pub struct CallSettings {
    /// Per-attempt deadline
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for CallSettings {
    fn from(llm: &LlmConfig) -> Self {
        Self {
            timeout: Duration::from_secs(llm.timeout_secs),
            max_retries: llm.max_retries,
            base_delay: Duration::from_millis(network::BASE_DELAY_MS),
            max_delay: Duration::from_secs(network::MAX_DELAY_SECS),
        }
    }
}

/// Provider handle plus call policy, cheap to clone into tasks
#[derive(Clone)]
pub struct SynthesisClient {
    provider: SharedProvider,
    settings: CallSettings,
    gate: Option<Arc<Semaphore>>,
}

impl SynthesisClient {
    pub fn new(provider: SharedProvider, settings: CallSettings) -> Self {
        Self {
            provider,
            settings,
            gate: None,
        }
    }

    /// Share an admission gate; each attempt holds one permit
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Ask the provider whether it can serve requests. Never fails; problems
    /// are logged and reported as `false`.
    pub async fn preflight(&self) -> bool {
        let name = self.provider.name();
        match with_timeout(
            self.settings.timeout,
            self.provider.health_check(),
            "health check",
        )
        .await
        {
            Ok(true) => {
                info!(provider = name, model = self.model(), "Provider ready");
                true
            }
            Ok(false) => {
                warn!(provider = name, "Provider health check failed");
                false
            }
            Err(e) => {
                warn!(provider = name, "Provider health check errored: {}", e);
                false
            }
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn settings(&self) -> &CallSettings {
        &self.settings
    }

    /// Run one synthesis request. `operation` names the call in logs and
    /// timeout errors.
    pub async fn call(
        &self,
        request: &SynthesisRequest,
        operation: &str,
    ) -> Result<LlmResponse, LlmError> {
        let provider_name = self.provider.name();
        let start = Instant::now();

        let attempt = || async {
            let _permit = match &self.gate {
                Some(gate) => Some(gate.acquire().await.map_err(|e| {
                    LlmError::with_provider(
                        ErrorCategory::Unknown,
                        format!("Concurrency gate closed: {}", e),
                        provider_name,
                    )
                })?),
                None => None,
            };
            let response = with_timeout(
                self.settings.timeout,
                self.provider.synthesize(request),
                operation,
            )
            .await
            .map_err(|e| ErrorClassifier::classify_wiki_error(&e, provider_name))?;

            if response.content.trim().is_empty() {
                return Err(LlmError::with_provider(
                    ErrorCategory::ParseError,
                    "empty response",
                    provider_name,
                ));
            }
            Ok(response)
        };

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.settings.base_delay)
            .with_max_delay(self.settings.max_delay)
            .with_max_times(self.settings.max_retries)
            .with_jitter();

        let result = attempt
            .retry(backoff)
            .sleep(tokio::time::sleep)
            .when(LlmError::is_retryable)
            .notify(|err: &LlmError, delay: Duration| {
                warn!(
                    operation,
                    category = %err.category,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying synthesis call"
                );
            })
            .await;

        match &result {
            Ok(response) => debug!(
                operation,
                provider = provider_name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                output_tokens = response.usage.output_tokens,
                "Synthesis call succeeded"
            ),
            Err(err) => warn!(
                operation,
                provider = provider_name,
                category = %err.category,
                "Synthesis call failed: {}",
                err.message
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::types::WikiError;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn settings(max_retries: usize) -> CallSettings {
        CallSettings {
            timeout: Duration::from_millis(200),
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn request() -> SynthesisRequest {
        SynthesisRequest::new("system", "user")
    }

    #[tokio::test]
    async fn test_single_shot_by_default() {
        let provider = Arc::new(ScriptedProvider::new(|_| {
            Err(WikiError::LlmApi("Connection reset".to_string()))
        }));
        let client = SynthesisClient::new(provider.clone(), settings(0));

        let err = client.call(&request(), "generate 100").await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::Network);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_retryable_failure_is_retried() {
        let provider = Arc::new(ScriptedProvider::sequence(vec![
            Err(WikiError::LlmApi("rate limit exceeded".to_string())),
            Ok("# Recovered".to_string()),
        ]));
        let client = SynthesisClient::new(provider.clone(), settings(2));

        let response = client.call(&request(), "generate 200").await.unwrap();
        assert_eq!(response.content, "# Recovered");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_stops_immediately() {
        let provider = Arc::new(ScriptedProvider::new(|_| {
            Err(WikiError::LlmApi("Invalid API key".to_string()))
        }));
        let client = SynthesisClient::new(provider.clone(), settings(3));

        let err = client.call(&request(), "generate 300").await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::Auth);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_classified() {
        let provider = Arc::new(
            ScriptedProvider::new(|_| Ok("late".to_string())).with_delay(Duration::from_secs(5)),
        );
        let client = SynthesisClient::new(provider, settings(0));

        let err = client.call(&request(), "generate 930").await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::Timeout);
        assert!(err.message.contains("generate 930"));
    }

    #[tokio::test]
    async fn test_gate_is_free_during_backoff() {
        let failed_once = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&failed_once);
        let provider = Arc::new(ScriptedProvider::new(move |request| {
            if request.user == "flaky" && !flag.swap(true, Ordering::SeqCst) {
                return Err(WikiError::LlmApi("rate limit exceeded".to_string()));
            }
            Ok(format!("# {}", request.user))
        }));
        let gate = Arc::new(Semaphore::new(1));
        let backoff = CallSettings {
            timeout: Duration::from_secs(1),
            max_retries: 1,
            base_delay: Duration::from_millis(400),
            max_delay: Duration::from_millis(400),
        };
        let flaky = SynthesisClient::new(provider.clone(), backoff).with_gate(Arc::clone(&gate));
        let steady = flaky.clone();

        let task = tokio::spawn(async move {
            flaky
                .call(&SynthesisRequest::new("system", "flaky"), "flaky")
                .await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        // First attempt failed; the retry is sleeping without a permit
        assert!(failed_once.load(Ordering::SeqCst));
        assert_eq!(gate.available_permits(), 1);
        let response = steady
            .call(&SynthesisRequest::new("system", "steady"), "steady")
            .await
            .unwrap();
        assert_eq!(response.content, "# steady");

        assert_eq!(task.await.unwrap().unwrap().content, "# flaky");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_preflight_reports_health() {
        let client = SynthesisClient::new(
            Arc::new(ScriptedProvider::new(|_| Ok("ok".to_string()))),
            settings(0),
        );
        assert!(client.preflight().await);

        let client = SynthesisClient::new(
            Arc::new(ScriptedProvider::new(|_| Ok("ok".to_string())).unhealthy()),
            settings(0),
        );
        assert!(!client.preflight().await);
    }

    #[tokio::test]
    async fn test_blank_response_is_an_error() {
        let provider = Arc::new(ScriptedProvider::new(|_| Ok("   \n".to_string())));
        let client = SynthesisClient::new(provider, settings(0));

        let err = client.call(&request(), "refine").await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::ParseError);
    }
}
