//! Generate Command
//!
//! Usage:
//!   repowiki generate <source> [--branch B] [--output DIR] [--provider P] [--model M]
//!                     [--concurrency N] [--timeout SECS] [--no-refine] [--no-overview] [--json]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use super::load_config;
use crate::ai::{CallSettings, ProviderConfig, SynthesisClient, create_provider};
use crate::cli::Output;
use crate::config::Config;
use crate::output::MarkdownWriter;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::selector::topic;
use crate::source::GitFetcher;
use crate::types::Result;

/// Command-line overrides applied on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub source: String,
    pub branch: Option<String>,
    pub output: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub no_refine: bool,
    pub no_overview: bool,
    pub json: bool,
}

impl GenerateOptions {
    fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.dir = output.clone();
        }
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.generation.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout_secs {
            config.llm.timeout_secs = timeout;
        }
        if self.no_refine {
            config.generation.refine_plan = false;
        }
        if self.no_overview {
            config.generation.overview = false;
        }
    }
}

pub fn run(options: GenerateOptions, config_path: Option<&Path>, quiet: bool) -> Result<()> {
    let mut config = load_config(config_path)?;
    options.apply(&mut config);
    config.validate()?;

    let provider = create_provider(&ProviderConfig::from(&config.llm))?;
    let client = SynthesisClient::new(provider, CallSettings::from(&config.llm));
    info!(
        provider = client.provider_name(),
        model = client.model(),
        concurrency = config.generation.concurrency,
        "Starting documentation run"
    );

    let out = Output::quiet(quiet);
    let rt = Runtime::new()?;
    if !rt.block_on(client.preflight()) {
        out.warning(&format!(
            "Provider '{}' failed its health check; topics may become placeholders",
            client.provider_name()
        ));
    }

    let writer = MarkdownWriter::new(&config.output.dir);
    let pipeline = Pipeline::new(
        config,
        client,
        Arc::new(GitFetcher::default()),
        Arc::new(writer),
    );
    let outcome = rt.block_on(pipeline.run(&options.source, options.branch.as_deref()))?;

    if options.json {
        println!("{}", render_json(&outcome)?);
    } else {
        print_summary(&out, &outcome);
    }
    Ok(())
}

fn render_json(outcome: &RunOutcome) -> Result<String> {
    let value = serde_json::json!({
        "run_id": outcome.run_id,
        "repository": outcome.repo.as_str(),
        "branch": outcome.branch,
        "commit": outcome.commit,
        "docs_dir": outcome.written.docs_dir,
        "files": outcome.written.files,
        "plan": outcome.plan,
        "report": outcome.report,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn print_summary(out: &Output, outcome: &RunOutcome) {
    let report = &outcome.report;

    out.header("Documentation Run");
    out.field("Run", &outcome.run_id);
    out.field("Repository", &outcome.repo);
    out.field("Branch", format!("{} @ {}", outcome.branch, outcome.commit));
    out.field(
        "Files",
        if report.index_truncated {
            format!("{} (truncated)", report.files_indexed)
        } else {
            report.files_indexed.to_string()
        },
    );
    out.field("Plan", format!("{} topics ({:?})", report.topics_planned, report.plan_source));

    out.section("Topics");
    for entry in &report.topics {
        let title = topic(entry.topic.as_str()).map(|t| t.title).unwrap_or("Unknown");
        let line = format!(
            "{} {} ({} batches, {:.1}s)",
            entry.topic,
            title,
            entry.batches,
            entry.elapsed_ms as f64 / 1000.0
        );
        match &entry.error {
            None => out.success(&line),
            Some(err) => out.error(&format!("{}: {}", line, err)),
        }
    }
    if report.overview_failed == Some(true) {
        out.warning("System overview failed; a placeholder was written");
    }
    if report.index_enhanced == Some(false) {
        out.warning("Index summary sections failed; the plain index was written");
    }

    out.section("Totals");
    out.field(
        "Documents",
        format!("{}/{} succeeded", report.succeeded, report.topics_planned),
    );
    out.field(
        "Tokens",
        format!(
            "{} in / {} out",
            report.usage.input_tokens, report.usage.output_tokens
        ),
    );
    if report.cost_usd > 0.0 {
        out.field("Cost", format!("${:.4}", report.cost_usd));
    }
    let lookups = report.cache_hits + report.cache_misses;
    if lookups > 0 {
        out.field(
            "Cache",
            format!(
                "{} hits / {} reads ({:.0}%)",
                report.cache_hits,
                lookups,
                report.cache_hit_rate * 100.0
            ),
        );
    }
    out.field("Elapsed", format!("{:.1}s", report.elapsed_ms as f64 / 1000.0));

    println!();
    if report.failed.is_empty() {
        out.success(&format!(
            "Wrote {} files to {}",
            outcome.written.files.len(),
            outcome.written.docs_dir.display()
        ));
    } else {
        out.warning(&format!(
            "Wrote {} files to {} ({} topics failed)",
            outcome.written.files.len(),
            outcome.written.docs_dir.display(),
            report.failed.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_override_config() {
        let options = GenerateOptions {
            source: ".".to_string(),
            output: Some(PathBuf::from("/tmp/docs")),
            provider: Some("ollama".to_string()),
            model: Some("llama3".to_string()),
            concurrency: Some(8),
            timeout_secs: Some(60),
            no_refine: true,
            no_overview: true,
            ..Default::default()
        };
        let mut config = Config::default();
        options.apply(&mut config);

        assert_eq!(config.output.dir, PathBuf::from("/tmp/docs"));
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.generation.concurrency, 8);
        assert_eq!(config.llm.timeout_secs, 60);
        assert!(!config.generation.refine_plan);
        assert!(!config.generation.overview);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        GenerateOptions::default().apply(&mut config);
        assert_eq!(config.llm.provider, "claude-code");
        assert!(config.generation.refine_plan);
        assert!(config.generation.overview);
    }
}
