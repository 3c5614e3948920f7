//! Prompt composition for planning, topic generation, the overview page and
//! the index summary sections.

use serde_json::json;

use super::context::RunContext;
use crate::ai::{PromptBuilder, SynthesisRequest};
use crate::batcher::ContentBatch;
use crate::selector::{MANDATORY_TOPICS, Topic, taxonomy_listing};

/// Characters of the directory tree sent with the refinement request
const REFINE_STRUCTURE_CHARS: usize = 4000;
/// Example paths per topic in the refinement summary
const REFINE_EXAMPLES: usize = 5;

/// Topics whose documents must contain a Mermaid diagram
pub const DIAGRAM_TOPICS: &[&str] = &["100", "101", "311", "421"];

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

// =============================================================================
// Planning
// =============================================================================

pub fn refinement_request(ctx: &RunContext) -> SynthesisRequest {
    let candidates: serde_json::Map<String, serde_json::Value> = ctx
        .candidates
        .iter()
        .map(|(id, files)| {
            let examples: Vec<&String> = files.iter().take(REFINE_EXAMPLES).collect();
            (
                id.to_string(),
                json!({ "count": files.len(), "examples": examples }),
            )
        })
        .collect();

    let always: Vec<&str> = MANDATORY_TOPICS.iter().map(|(id, _)| *id).collect();
    let payload = json!({
        "taxonomy": taxonomy_listing(),
        "structure": truncate_chars(&ctx.tree, REFINE_STRUCTURE_CHARS),
        "candidates": candidates,
        "instruction": format!(
            "Return JSON mapping doc_id -> reason. Always include {}. \
             Keep only doc_ids with evidence (count > 0 or critical).",
            always.join(", ")
        ),
    });

    SynthesisRequest::new(
        "You return only compact JSON with reasons.",
        payload.to_string(),
    )
}

// =============================================================================
// Topic generation
// =============================================================================

/// Inputs for one batch of one topic
#[derive(Debug, Clone, Copy)]
pub struct TopicPrompt<'a> {
    pub topic: &'a Topic,
    pub reason: &'a str,
    /// `YYYY-MM-DD`
    pub date: &'a str,
    pub batch: &'a ContentBatch,
    /// Excerpt of the document produced from previous batches
    pub draft: Option<&'a str>,
}

fn topic_guidance(topic: &str) -> &'static str {
    match topic {
        "100" => {
            "Include a subsection \"Agent Workflow & Large Files\" explaining how this \
             documentation was produced: single-pass repository scan and file indexing \
             (vendor and build directories ignored), candidate selection per document type, \
             chunked reading of oversized files with a per-file chunk limit, content-hash \
             deduplication and bounded concurrency of generation calls."
        }
        "980" => {
            "Add a section \"Agent Prompts & Pipeline\" that cites prompt or agent \
             configuration files from the repository if any exist, and otherwise summarizes \
             the generic workflow for planning documents, chunking large files and writing \
             outputs. Add a \"Large File Handling\" subsection summarizing chunk sizes, chunk \
             limits, deduplication and candidate sampling."
        }
        _ => "",
    }
}

pub fn generation_request(ctx: &RunContext, prompt: &TopicPrompt<'_>) -> SynthesisRequest {
    let topic = prompt.topic;

    let mut rules = vec![
        "Output Markdown only, with no YAML frontmatter.".to_string(),
        format!("Start with a top-level heading: # {}.", topic.title),
        format!(
            "Include a metadata table with Repo ({}), Doc Type (\"{}\", not the numeric id), \
             Date ({}) and Branch ({}).",
            ctx.repo_name(),
            topic.title,
            prompt.date,
            ctx.branch
        ),
        "When citing files, refer to the \"Last modified\" dates given in the file headers."
            .to_string(),
        "Use project-relative paths for file references, without markdown links.".to_string(),
        "End with a \"Primary Sources\" section of markdown footnotes (e.g. [^1]: path/to/file). \
         Every footnote must be referenced at least once. Omit the section if there are no sources."
            .to_string(),
        "Include short, relevant code snippets (3-10 lines) from the provided files in fenced \
         code blocks with a language tag."
            .to_string(),
    ];
    if DIAGRAM_TOPICS.contains(&topic.id) {
        rules.push(
            "Include a Mermaid flowchart. Keep node labels alphanumeric with spaces, avoid the \
             characters < > : |, and make every edge end at a defined node."
                .to_string(),
        );
    }
    if prompt.draft.is_some() {
        rules.push(
            "A draft from earlier file batches is provided. Return the complete revised \
             document, keeping its valid content and extending it with the new files."
                .to_string(),
        );
    }

    let system = PromptBuilder::new()
        .role(
            "technical writer",
            &format!(
                "generating document {} ({}) for the repository '{}'",
                topic.id,
                topic.title,
                ctx.repo_name()
            ),
        )
        .rules(rules)
        .custom(topic_guidance(topic.id))
        .build();

    let batch = prompt.batch;
    let user = PromptBuilder::new()
        .section(
            "Task",
            &format!("Generate the content for document ID {}.", topic.id),
        )
        .section("Reason/Context", prompt.reason)
        .section("File Structure", &ctx.tree)
        .section_if("Draft So Far", prompt.draft.unwrap_or_default())
        .section(
            &format!(
                "Relevant Files ({}, with timestamps and line numbers)",
                batch.label
            ),
            if batch.text.is_empty() {
                "(no matching files)"
            } else {
                batch.text.as_str()
            },
        )
        .build();

    SynthesisRequest::new(system, user)
}

// =============================================================================
// System overview
// =============================================================================

/// `- path | ext | size | mtime` lines for the first `max` records
fn file_inventory(ctx: &RunContext, max: usize) -> String {
    let records = ctx.index.records();
    let mut inventory = format!("Total files indexed: {}\n\n", records.len());
    for record in records.iter().take(max) {
        inventory.push_str(&format!(
            "- {} | {} | {} bytes | Modified: {}\n",
            record.path,
            record.extension.as_deref().unwrap_or("noext"),
            record.size,
            record.modified_label()
        ));
    }
    if records.len() > max {
        inventory.push_str("... [TRUNCATED: inventory shortened for brevity] ...\n");
    }
    inventory
}

pub fn overview_request(
    ctx: &RunContext,
    documents_head: &str,
    max_inventory: usize,
) -> SynthesisRequest {
    let inventory = file_inventory(ctx, max_inventory);

    let system = PromptBuilder::new()
        .role(
            "technical writer",
            &format!(
                "creating a system overview for the repository '{}'",
                ctx.repo_name()
            ),
        )
        .rules([
            "Output Markdown only, with no YAML frontmatter.".to_string(),
            "Start with a top-level heading: # System Overview.".to_string(),
            format!(
                "Include a metadata table with Repo ({}), Doc Type (System Overview), \
                 Date ({}) and Branch ({}).",
                ctx.repo_name(),
                ctx.started_at.format("%Y-%m-%d"),
                ctx.branch
            ),
            "Summarize the whole system, its key components and how they fit together."
                .to_string(),
            "Include a \"File Inventory\" section covering the listed files and their roles."
                .to_string(),
            "Include a Mermaid flowchart of the overall architecture if possible.".to_string(),
            "End with a \"Primary Sources\" section of footnotes listing the documents used."
                .to_string(),
        ])
        .build();

    let user = PromptBuilder::new()
        .section("Complete File Listing", &inventory)
        .section("Generated Documentation Content", documents_head)
        .build();

    SynthesisRequest::new(system, user)
}

// =============================================================================
// Index sections
// =============================================================================

/// Sections placed above the document list in `index.md`
pub const INDEX_SECTIONS: &[&str] = &[
    "Purpose and Scope",
    "What is this Repo about?",
    "Repo Structure",
    "Repository Architecture Overview",
    "Key Components",
    "Module Descriptions",
];

pub fn index_sections_request(
    ctx: &RunContext,
    documents_head: &str,
    max_inventory: usize,
) -> SynthesisRequest {
    let inventory = file_inventory(ctx, max_inventory);
    let sections = INDEX_SECTIONS
        .iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");

    let system = PromptBuilder::new()
        .role(
            "technical writer",
            &format!(
                "enhancing the Documentation Index page for '{}'",
                ctx.repo_name()
            ),
        )
        .rules([
            "Return only the markdown for the new sections, with no YAML frontmatter."
                .to_string(),
            "Do not include the document list; it is added separately.".to_string(),
            "Format Repo Structure as a table with columns Directory/File | Description \
             covering every listed directory and file."
                .to_string(),
        ])
        .build();

    let user = PromptBuilder::new()
        .section("Sections", &sections)
        .section("Complete File Listing", &inventory)
        .section("Generated Documentation Summary", documents_head)
        .build();

    SynthesisRequest::new(system, user)
}
