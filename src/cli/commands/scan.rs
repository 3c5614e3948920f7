//! Scan Command
//!
//! Runs the scanner and candidate selector without calling any provider.
//!
//! Usage:
//!   repowiki scan [path] [-f text|json]

use std::path::{Path, PathBuf};

use super::load_config;
use crate::cli::Output;
use crate::scanner::{ScanResult, scan_repository};
use crate::selector::{CandidateMap, TOPICS, select_candidates};
use crate::types::{Result, WikiError};

pub fn run(path: Option<PathBuf>, format: &str, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let root = path.unwrap_or_else(|| PathBuf::from("."));

    let scan = scan_repository(&root, &config.scan)?;
    let candidates = select_candidates(&scan.index);

    match format {
        "json" => println!("{}", render_json(&scan, &candidates)?),
        "text" => print_text(&Output::new(), &scan, &candidates),
        other => {
            return Err(WikiError::Config(format!(
                "Unknown format '{}'. Valid values: text, json",
                other
            )));
        }
    }
    Ok(())
}

pub fn render_json(scan: &ScanResult, candidates: &CandidateMap) -> Result<String> {
    let duplicates: Vec<&[String]> = scan.hashes.duplicate_groups().map(|(_, p)| p).collect();
    let value = serde_json::json!({
        "root": scan.root,
        "truncated": scan.index.is_truncated(),
        "files": scan.index.records(),
        "duplicates": duplicates,
        "candidates": candidates,
        "tree": scan.tree,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn print_text(out: &Output, scan: &ScanResult, candidates: &CandidateMap) {
    let index = &scan.index;
    let oversized = index.iter().filter(|r| r.oversized).count();
    let duplicate_groups = scan.hashes.duplicate_groups().count();

    out.header(&format!("Scan: {}", scan.root.display()));
    out.field("Files", index.len());
    out.field("Text", index.text_count());
    out.field("Oversized", oversized);
    out.field("Total size", format!("{} bytes", index.total_size()));
    out.field("Duplicates", format!("{} groups", duplicate_groups));
    if index.is_truncated() {
        out.warning("File limit reached; the index is incomplete");
    }

    out.section("Candidates");
    for topic in TOPICS {
        let count = candidates.get(topic.id).len();
        if count > 0 {
            out.line(&format!("  {} {:<32} {:>5}", topic.id, topic.title, count));
        }
    }

    out.section("Structure");
    out.line(&scan.tree);
}
