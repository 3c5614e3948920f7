//! Unified Error Type System
//!
//! One error enum (`WikiError`) for the whole crate plus the structured
//! `LlmError` produced at the synthesis boundary.
//!
//! ## Error Categories
//!
//! Rate limits, network failures, transient server errors and timeouts are
//! retryable; auth, bad requests and token-limit overruns are not.
//!
//! Only two failures are fatal for a run: an unreadable scan root and an
//! unwritable output target. Everything else is recovered per file or per topic.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Categories used to decide whether a synthesis call may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry
    RateLimit,
    /// Prompt exceeds the model context
    TokenLimit,
    /// Authentication failed - never retried
    Auth,
    /// Network/connectivity issues
    Network,
    /// Provider unavailable
    Unavailable,
    /// Invalid request - never retried
    BadRequest,
    /// Response could not be parsed
    ParseError,
    /// Temporary server issues
    Transient,
    /// Call exceeded its deadline
    Timeout,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether another attempt against the same provider can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::Timeout
        )
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Failure of a single synthesis call
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps provider failures onto [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a free-form error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider);
        }

        if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("context length")
            || lower.contains("too large")
        {
            return LlmError::with_provider(ErrorCategory::TokenLimit, message, provider);
        }

        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("timed out") || lower.contains("deadline") {
            return LlmError::with_provider(ErrorCategory::Timeout, message, provider);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("unreachable")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("service unavailable")
            || lower.contains("not installed")
            || lower.contains("failed to spawn")
        {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("400") || lower.contains("bad request") || lower.contains("malformed") {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        if lower.contains("parse") || lower.contains("json") || lower.contains("empty response") {
            return LlmError::with_provider(ErrorCategory::ParseError, message, provider);
        }

        if lower.contains("temporary")
            || lower.contains("overloaded")
            || lower.contains("non-zero status")
        {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify an HTTP status code directly
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            500 | 502 | 503 | 504 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
            }
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Route a crate error raised by a provider
    pub fn classify_wiki_error(err: &WikiError, provider: &str) -> LlmError {
        match err {
            WikiError::Llm(llm_err) => {
                let mut classified = llm_err.clone();
                if classified.provider.is_none() {
                    classified.provider = Some(provider.to_string());
                }
                classified
            }
            WikiError::LlmApi(msg) => Self::classify(msg, provider),
            WikiError::Timeout { .. } => {
                LlmError::with_provider(ErrorCategory::Timeout, err.to_string(), provider)
            }
            WikiError::Json(_) => {
                LlmError::with_provider(ErrorCategory::ParseError, err.to_string(), provider)
            }
            WikiError::Config(_) => {
                LlmError::with_provider(ErrorCategory::BadRequest, err.to_string(), provider)
            }
            WikiError::Io(_) => {
                LlmError::with_provider(ErrorCategory::Unavailable, err.to_string(), provider)
            }
            _ => LlmError::with_provider(ErrorCategory::Unknown, err.to_string(), provider),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum WikiError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Unclassified provider failure; see [`ErrorClassifier::classify`]
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Fatal run errors
    // -------------------------------------------------------------------------
    #[error("Cannot scan {}: {reason}", path.display())]
    ScanRoot { path: PathBuf, reason: String },

    #[error("Cannot write documentation to {}: {reason}", path.display())]
    Output { path: PathBuf, reason: String },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Source fetch failed: {0}")]
    Source(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Task join error: {0}")]
    Join(String),
}

impl From<LlmError> for WikiError {
    fn from(err: LlmError) -> Self {
        WikiError::Llm(err)
    }
}

impl From<tokio::task::JoinError> for WikiError {
    fn from(err: tokio::task::JoinError) -> Self {
        WikiError::Join(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WikiError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl WikiError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn scan_root(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::ScanRoot {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn output(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Output {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Fatal errors abort the run; everything else is recovered where it happens
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ScanRoot { .. } | Self::Output { .. })
    }
}

// =============================================================================
// Tests
// =============================================================================
