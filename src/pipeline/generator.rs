//! Fan-out/fan-in document generation.
//!
//! One future per planned topic, all driven together by `join_all`. A shared
//! semaphore bounds how many synthesis attempts are in flight (retry backoff
//! does not hold a slot); within a topic,
//! batches run strictly in order and each batch sees an excerpt of the draft
//! produced so far. A topic's document is the text returned for its last
//! batch. Failures stay local to their topic and become placeholders.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::content::{GeneratedContent, placeholder};
use super::context::RunContext;
use super::planner::Plan;
use super::prompts::{self, TopicPrompt};
use crate::ai::{SynthesisClient, TokenUsage};
use crate::batcher::{BatchSettings, ContentBatch, FileContentCache, TopicBatcher};
use crate::config::{BatchingConfig, Config, ScanConfig};
use crate::selector;
use crate::types::{Result, TopicId, WikiError};

/// Settings for the generation stage
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub concurrency: usize,
    pub draft_excerpt_chars: usize,
    pub batching: BatchingConfig,
    pub scan: ScanConfig,
}

impl From<&Config> for GenerationSettings {
    fn from(config: &Config) -> Self {
        Self {
            concurrency: config.generation.concurrency,
            draft_excerpt_chars: config.generation.draft_excerpt_chars,
            batching: config.batching.clone(),
            scan: config.scan.clone(),
        }
    }
}

/// Per-topic outcome for the run report
#[derive(Debug, Clone, Serialize)]
pub struct TopicReport {
    pub topic: TopicId,
    pub batches: usize,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub elapsed_ms: u64,
    /// Failure reason when the document is a placeholder
    pub error: Option<String>,
}

impl TopicReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

struct TopicOutput {
    content: String,
    batches: usize,
    usage: TokenUsage,
    cost_usd: f64,
}

/// Generates every planned topic
pub struct Generator {
    ctx: Arc<RunContext>,
    client: SynthesisClient,
    cache: Arc<FileContentCache>,
    settings: GenerationSettings,
}

impl Generator {
    pub fn new(
        ctx: Arc<RunContext>,
        client: SynthesisClient,
        cache: Arc<FileContentCache>,
        settings: GenerationSettings,
    ) -> Self {
        let gate = Arc::new(Semaphore::new(settings.concurrency.max(1)));
        Self {
            ctx,
            client: client.with_gate(gate),
            cache,
            settings,
        }
    }

    /// Run all topics and merge their documents; the result has exactly the
    /// planned keys.
    pub async fn generate_all(&self, plan: &Plan) -> (GeneratedContent, Vec<TopicReport>) {
        info!(
            topics = plan.len(),
            concurrency = self.settings.concurrency,
            "Generating documents"
        );

        let tasks = plan
            .iter()
            .map(|(topic, reason)| self.generate_one(topic.clone(), reason.clone()));
        let results = join_all(tasks).await;

        let mut content = GeneratedContent::new();
        let mut reports = Vec::with_capacity(results.len());
        for (topic, document, report) in results {
            content.insert(topic, document);
            reports.push(report);
        }
        (content, reports)
    }

    async fn generate_one(&self, topic: TopicId, reason: String) -> (TopicId, String, TopicReport) {
        let start = Instant::now();
        let result = self.generate_topic(&topic, &reason).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                info!(topic = %topic, batches = output.batches, elapsed_ms, "Document generated");
                let report = TopicReport {
                    topic: topic.clone(),
                    batches: output.batches,
                    usage: output.usage,
                    cost_usd: output.cost_usd,
                    elapsed_ms,
                    error: None,
                };
                (topic, output.content, report)
            }
            Err(err) => {
                let reason = failure_reason(&err);
                warn!(topic = %topic, error = %reason, "Document generation failed");
                let report = TopicReport {
                    topic: topic.clone(),
                    batches: 0,
                    usage: TokenUsage::default(),
                    cost_usd: 0.0,
                    elapsed_ms,
                    error: Some(reason.clone()),
                };
                let text = placeholder(topic.as_str(), &reason);
                (topic, text, report)
            }
        }
    }

    async fn generate_topic(&self, topic_id: &TopicId, reason: &str) -> Result<TopicOutput> {
        let topic = selector::topic(topic_id.as_str())
            .ok_or_else(|| WikiError::Config(format!("Unknown topic {}", topic_id)))?;

        let mut batcher = TopicBatcher::new(
            topic.id,
            self.ctx.root(),
            Arc::clone(&self.ctx.index),
            Arc::clone(&self.ctx.hashes),
            Arc::clone(&self.cache),
            self.ctx.candidates.get(topic.id),
            BatchSettings::for_topic(topic.id, &self.settings.batching, &self.settings.scan),
        );
        debug!(
            topic = topic.id,
            candidates = batcher.candidate_count(),
            batches = batcher.total_batches(),
            "Topic batching planned"
        );

        let operation = format!("generate {}", topic.id);
        let mut draft: Option<String> = None;
        let mut latest: Option<DateTime<Utc>> = None;
        let mut output = TopicOutput {
            content: String::new(),
            batches: 0,
            usage: TokenUsage::default(),
            cost_usd: 0.0,
        };

        loop {
            let (returned, batch) = next_batch(batcher).await?;
            batcher = returned;
            let Some(batch) = batch else { break };

            latest = latest.max(batch.latest_modified);
            let date = document_date(latest);
            let excerpt = draft
                .as_deref()
                .map(|d| prompts::truncate_chars(d, self.settings.draft_excerpt_chars));

            let request = prompts::generation_request(
                &self.ctx,
                &TopicPrompt {
                    topic,
                    reason,
                    date: &date,
                    batch: &batch,
                    draft: excerpt,
                },
            );

            debug!(
                topic = topic.id,
                batch = %batch.label,
                files = batch.files.len(),
                chars = batch.char_count,
                "Sending batch"
            );

            let response = self.client.call(&request, &operation).await?;

            output.batches += 1;
            output.usage += response.usage;
            output.cost_usd += response.cost_usd;
            draft = Some(response.content);
        }

        output.content = draft.ok_or_else(|| {
            WikiError::LlmApi(format!("No batches produced for topic {}", topic.id))
        })?;
        Ok(output)
    }
}

/// Render the next batch off the async runtime; the batcher is moved in and
/// handed back.
async fn next_batch(mut batcher: TopicBatcher) -> Result<(TopicBatcher, Option<ContentBatch>)> {
    let result = tokio::task::spawn_blocking(move || {
        let batch = batcher.next_batch();
        (batcher, batch)
    })
    .await?;
    Ok(result)
}

/// `YYYY-MM-DD` of the latest file seen, or today
pub fn document_date(latest: Option<DateTime<Utc>>) -> String {
    latest.unwrap_or_else(Utc::now).format("%Y-%m-%d").to_string()
}

fn failure_reason(err: &WikiError) -> String {
    match err {
        WikiError::Llm(llm) => llm.to_string(),
        other => other.to_string(),
    }
}
