//! Configuration Types
//!
//! All configuration structures with defaults taken from [`crate::constants`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{batching, generation, network, scan};
use crate::types::{Result, WikiError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Repository scanner settings
    pub scan: ScanConfig,

    /// Content batcher settings
    pub batching: BatchingConfig,

    /// Generation orchestrator settings
    pub generation: GenerationConfig,

    /// Document writer settings
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            scan: ScanConfig::default(),
            batching: BatchingConfig::default(),
            generation: GenerationConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(WikiError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(WikiError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        let non_zero = [
            ("scan.max_files", self.scan.max_files as u64),
            ("scan.chunk_size", self.scan.chunk_size),
            ("batching.batch_size", self.batching.batch_size as u64),
            ("batching.topic_char_budget", self.batching.topic_char_budget as u64),
            (
                "batching.catch_all_char_budget",
                self.batching.catch_all_char_budget as u64,
            ),
            ("batching.max_candidates", self.batching.max_candidates as u64),
            (
                "batching.max_catch_all_candidates",
                self.batching.max_catch_all_candidates as u64,
            ),
            ("generation.concurrency", self.generation.concurrency as u64),
        ];
        if let Some((name, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(WikiError::Config(format!("{} must be greater than 0", name)));
        }

        if self.scan.oversized_cap < self.scan.hash_size_cap {
            return Err(WikiError::Config(format!(
                "scan.oversized_cap ({}) must not be smaller than scan.hash_size_cap ({})",
                self.scan.oversized_cap, self.scan.hash_size_cap
            )));
        }

        for pattern in &self.scan.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                WikiError::Config(format!("Invalid scan.exclude pattern '{}': {}", pattern, e))
            })?;
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: claude-code, openai, ollama
    pub provider: String,

    /// Model name
    pub model: String,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Custom endpoint for HTTP providers
    pub api_base: Option<String>,

    /// Maximum tokens to generate per call
    pub max_tokens: usize,

    /// Retries after the first attempt for retryable failures
    pub max_retries: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "claude-code".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            api_base: None,
            max_tokens: 8192,
            max_retries: network::DEFAULT_MAX_RETRIES,
        }
    }
}

// =============================================================================
// Scan Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Stop scanning after this many files
    pub max_files: usize,

    /// Text files up to this size (bytes) get a content hash
    pub hash_size_cap: u64,

    /// Files above this size (bytes) are only read in chunks
    pub oversized_cap: u64,

    /// Chunk size (bytes) for oversized files
    pub chunk_size: u64,

    /// Directory tree rendering depth
    pub tree_depth: usize,

    /// Additional directory names to prune
    pub extra_ignore_dirs: Vec<String>,

    /// Glob patterns (relative paths) excluded from the index
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: scan::MAX_FILES,
            hash_size_cap: scan::HASH_SIZE_CAP,
            oversized_cap: scan::OVERSIZED_CAP,
            chunk_size: scan::CHUNK_SIZE,
            tree_depth: scan::TREE_DEPTH,
            extra_ignore_dirs: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

// =============================================================================
// Batching Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub batch_size: usize,
    pub max_chunks_per_file: usize,
    pub max_chars_per_file: usize,
    pub topic_char_budget: usize,
    pub catch_all_char_budget: usize,
    pub max_candidates: usize,
    pub max_catch_all_candidates: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: batching::BATCH_SIZE,
            max_chunks_per_file: batching::MAX_CHUNKS_PER_FILE,
            max_chars_per_file: batching::MAX_CHARS_PER_FILE,
            topic_char_budget: batching::TOPIC_CHAR_BUDGET,
            catch_all_char_budget: batching::CATCH_ALL_CHAR_BUDGET,
            max_candidates: batching::MAX_CANDIDATES,
            max_catch_all_candidates: batching::MAX_CATCH_ALL_CANDIDATES,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Concurrent synthesis calls across all topics
    pub concurrency: usize,

    /// Ask the provider to refine the heuristic plan
    pub refine_plan: bool,

    /// Generate the 000 system overview page and the index summary sections
    pub overview: bool,

    /// Characters of the running draft passed to the next batch
    pub draft_excerpt_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            concurrency: generation::CONCURRENCY,
            refine_plan: true,
            overview: true,
            draft_excerpt_chars: generation::DRAFT_EXCERPT_CHARS,
        }
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for generated documentation
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(generation::OUTPUT_DIR),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "claude-code");
        assert_eq!(config.generation.concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.generation.concurrency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("generation.concurrency"));
    }

    #[test]
    fn test_validate_rejects_inverted_caps() {
        let mut config = Config::default();
        config.scan.oversized_cap = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_temperature_and_glob() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scan.exclude = vec!["[".to_string()];
        assert!(config.validate().is_err());
    }
}
