//! repowiki - Repository Documentation Generator
//!
//! Scans a source repository once, maps its files onto a fixed documentation
//! taxonomy, feeds each topic's files to an LLM in budgeted batches and
//! writes one markdown document per topic.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use repowiki::{Config, Pipeline, SynthesisClient, CallSettings, create_provider};
//! use repowiki::output::MarkdownWriter;
//! use repowiki::source::GitFetcher;
//!
//! let config = Config::default();
//! let provider = create_provider(&(&config.llm).into())?;
//! let client = SynthesisClient::new(provider, CallSettings::from(&config.llm));
//! let writer = MarkdownWriter::new(&config.output.dir);
//! let pipeline = Pipeline::new(config, client, Arc::new(GitFetcher::default()), Arc::new(writer));
//! let outcome = pipeline.run("https://github.com/acme/widgets", None).await?;
//! ```
//!
//! ## Modules
//!
//! - [`scanner`]: single-pass file index, content hashes, directory tree
//! - [`selector`]: topic taxonomy and candidate selection
//! - [`batcher`]: budgeted, deduplicated, line-numbered content batches
//! - [`pipeline`]: planning, concurrent generation, link rewriting
//! - [`ai`]: LLM providers, prompts, timeouts and retry
//! - [`source`]: repository fetching and identification
//! - [`output`]: markdown persistence

pub mod ai;
pub mod batcher;
pub mod cli;
pub mod config;
pub mod constants;
pub mod output;
pub mod pipeline;
pub mod scanner;
pub mod selector;
pub mod source;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::{ErrorCategory, LlmError, Result, TopicId, WikiError};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{
    GeneratedContent, Pipeline, Plan, PlanSource, RunContext, RunOutcome, RunReport, RunStage,
};
pub use scanner::{FileIndex, FileRecord, HashIndex, scan_repository};
pub use selector::{CandidateMap, select_candidates};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    CallSettings, LlmProvider, LlmResponse, SynthesisClient, SynthesisRequest, create_provider,
    with_timeout,
};
