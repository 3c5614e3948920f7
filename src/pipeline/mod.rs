//! Generation Orchestrator
//!
//! Runs one documentation pass over a repository:
//!
//! ```text
//! Scanned → Planned → Generating → LinksFixed → Written
//! ```
//!
//! Scan and writer failures abort the run. Everything else is recovered
//! where it happens. A failed refinement keeps the heuristic plan. A failed
//! topic or overview becomes a placeholder. A failed index enhancement
//! leaves the plain index.

mod content;
mod context;
mod generator;
mod links;
mod overview;
mod planner;
mod prompts;

pub use content::{GeneratedContent, is_placeholder, placeholder};
pub use context::RunContext;
pub use generator::{GenerationSettings, Generator, TopicReport, document_date};
pub use links::LinkRewriter;
pub use overview::{IndexSections, Overview, documents_head, enhance_index, generate_overview};
pub use planner::{
    Plan, PlanSource, heuristic_plan, merge_refinement, parse_refinement, plan_documentation,
};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::ai::{SynthesisClient, TokenUsage};
use crate::batcher::{CacheStats, FileContentCache};
use crate::config::Config;
use crate::constants::generation;
use crate::output::{DocumentWriter, WriteRequest, WrittenDocs};
use crate::scanner::scan_repository;
use crate::source::{RepoId, SourceFetcher};
use crate::types::{Result, TopicId};

/// Orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Scanned,
    Planned,
    Generating,
    LinksFixed,
    Written,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Scanned => "scanned",
            Self::Planned => "planned",
            Self::Generating => "generating",
            Self::LinksFixed => "links_fixed",
            Self::Written => "written",
        };
        f.write_str(name)
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub files_indexed: usize,
    pub index_truncated: bool,
    pub plan_source: PlanSource,
    pub topics_planned: usize,
    pub succeeded: usize,
    pub failed: Vec<TopicId>,
    pub overview_failed: Option<bool>,
    /// Whether summary sections were added to the index; `None` when skipped
    pub index_enhanced: Option<bool>,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub elapsed_ms: u64,
    pub topics: Vec<TopicReport>,
}

/// Everything a run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    pub repo: RepoId,
    pub branch: String,
    pub commit: String,
    pub plan: Plan,
    pub documents: GeneratedContent,
    pub overview: Option<String>,
    pub written: WrittenDocs,
    pub report: RunReport,
}

pub struct Pipeline {
    config: Config,
    client: SynthesisClient,
    fetcher: Arc<dyn SourceFetcher>,
    writer: Arc<dyn DocumentWriter>,
    fallback_dir: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        client: SynthesisClient,
        fetcher: Arc<dyn SourceFetcher>,
        writer: Arc<dyn DocumentWriter>,
    ) -> Self {
        Self {
            config,
            client,
            fetcher,
            writer,
            fallback_dir: None,
        }
    }

    /// Directory scanned when fetching fails; defaults to the working directory
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = Some(dir.into());
        self
    }

    #[instrument(skip(self), fields(provider = self.client.provider_name()))]
    pub async fn run(&self, source: &str, branch: Option<&str>) -> Result<RunOutcome> {
        let start = Instant::now();
        let (checkout, fetched) = self.resolve_checkout(source, branch).await?;

        let result = self.run_checkout(source, branch, &checkout, start).await;
        if fetched {
            self.fetcher.release(&checkout).await;
        }
        result
    }

    async fn run_checkout(
        &self,
        source: &str,
        branch: Option<&str>,
        checkout: &Path,
        start: Instant,
    ) -> Result<RunOutcome> {
        // Scanned
        let mut info = self.fetcher.describe(checkout).await;
        if info.branch == "unknown"
            && let Some(requested) = branch
        {
            info.branch = requested.to_string();
        }

        let scan_config = self.config.scan.clone();
        let scan_root = checkout.to_path_buf();
        let scan =
            tokio::task::spawn_blocking(move || scan_repository(&scan_root, &scan_config))
                .await??;

        let repo = if Path::new(source).is_dir() {
            RepoId::parse(&checkout.to_string_lossy())
        } else {
            RepoId::parse(source)
        };
        let ctx = Arc::new(RunContext::new(repo, info, scan));
        info!(
            stage = %RunStage::Scanned,
            run_id = %ctx.run_id,
            files = ctx.index.len(),
            branch = %ctx.branch,
            commit = %ctx.commit,
            "Repository indexed"
        );

        // Planned
        let refiner = self.config.generation.refine_plan.then_some(&self.client);
        let (plan, plan_source) = plan_documentation(&ctx, refiner).await;
        info!(
            stage = %RunStage::Planned,
            topics = plan.len(),
            source = ?plan_source,
            planned = %plan.topics().map(TopicId::as_str).collect::<Vec<_>>().join(", "),
            "Documentation planned"
        );

        // Generating
        info!(stage = %RunStage::Generating, "Generating documents");
        let cache = Arc::new(FileContentCache::new());
        let generator = Generator::new(
            Arc::clone(&ctx),
            self.client.clone(),
            Arc::clone(&cache),
            GenerationSettings::from(&self.config),
        );
        let (documents, topic_reports) = generator.generate_all(&plan).await;
        let cache_stats = cache.stats();
        cache.clear();

        // LinksFixed
        let documents = match ctx.repo.blob_base(&ctx.branch) {
            Some(base) => match LinkRewriter::new(&ctx.index, base) {
                Ok(rewriter) => rewriter.rewrite_all(documents),
                Err(e) => {
                    warn!(error = %e, "Link rewriting unavailable, keeping documents as generated");
                    documents
                }
            },
            None => {
                debug!(repo = %ctx.repo, "Repository has no web URL, skipping link rewriting");
                documents
            }
        };
        info!(stage = %RunStage::LinksFixed, documents = documents.len(), "Links fixed");

        let (overview, index_sections) = if self.config.generation.overview {
            let overview = generate_overview(
                &ctx,
                &documents,
                &self.client,
                generation::OVERVIEW_MAX_FILES,
                generation::OVERVIEW_DOCS_CHARS,
            )
            .await;
            let sections = enhance_index(
                &ctx,
                &documents,
                &self.client,
                generation::OVERVIEW_MAX_FILES,
                generation::INDEX_DOCS_CHARS,
            )
            .await;
            (Some(overview), sections)
        } else {
            (None, None)
        };

        // Written
        let written = self.writer.write(&WriteRequest {
            run_id: &ctx.run_id,
            repo: &ctx.repo,
            documents: &documents,
            overview: overview.as_ref().map(|o| o.content.as_str()),
            index_sections: index_sections.as_ref().map(|s| s.content.as_str()),
        })?;
        info!(
            stage = %RunStage::Written,
            dir = %written.docs_dir.display(),
            files = written.files.len(),
            "Documentation written"
        );

        let report = build_report(
            &ctx,
            plan_source,
            &plan,
            &documents,
            topic_reports,
            overview.as_ref(),
            index_sections.as_ref(),
            cache_stats,
            start.elapsed().as_millis() as u64,
        );

        Ok(RunOutcome {
            run_id: ctx.run_id.clone(),
            repo: ctx.repo.clone(),
            branch: ctx.branch.clone(),
            commit: ctx.commit.clone(),
            plan,
            documents,
            overview: overview.map(|o| o.content),
            written,
            report,
        })
    }

    /// Fetch the source; on failure fall back to a local directory. The flag
    /// is false for the fallback, which is never released.
    async fn resolve_checkout(
        &self,
        source: &str,
        branch: Option<&str>,
    ) -> Result<(PathBuf, bool)> {
        match self.fetcher.fetch(source, branch).await {
            Ok(path) => Ok((path, true)),
            Err(err) => {
                let fallback = match &self.fallback_dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir()?,
                };
                warn!(
                    error = %err,
                    fallback = %fallback.display(),
                    "Fetch failed, scanning fallback directory"
                );
                Ok((fallback, false))
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_report(
    ctx: &RunContext,
    plan_source: PlanSource,
    plan: &Plan,
    documents: &GeneratedContent,
    topics: Vec<TopicReport>,
    overview: Option<&Overview>,
    index_sections: Option<&IndexSections>,
    cache: CacheStats,
    elapsed_ms: u64,
) -> RunReport {
    let mut usage = TokenUsage::default();
    let mut cost_usd = 0.0;
    for report in &topics {
        usage += report.usage;
        cost_usd += report.cost_usd;
    }
    if let Some(overview) = overview {
        usage += overview.usage;
    }
    if let Some(sections) = index_sections {
        usage += sections.usage;
    }
    let failed: Vec<TopicId> = documents.failed().cloned().collect();

    RunReport {
        files_indexed: ctx.index.len(),
        index_truncated: ctx.index.is_truncated(),
        plan_source,
        topics_planned: plan.len(),
        succeeded: documents.len() - failed.len(),
        failed,
        overview_failed: overview.map(|o| o.failed),
        index_enhanced: overview.map(|_| index_sections.is_some()),
        usage,
        cost_usd,
        cache_hits: cache.hits,
        cache_misses: cache.misses,
        cache_hit_rate: cache.hit_rate(),
        elapsed_ms,
        topics,
    }
}
