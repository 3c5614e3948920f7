//! Content Batcher
//!
//! Turns one topic's candidate list into an ordered, lazily produced sequence
//! of size-bounded text batches:
//!
//! 1. candidates sorted by size, smallest first, and capped
//! 2. partitioned into fixed-size batches
//! 3. each file read once per topic (content hash dedup)
//! 4. oversized files contribute only their first chunks, each labelled
//!    with its byte range
//! 5. every line numbered, every file headed with its modification time
//! 6. emission stops as soon as the next piece would exceed the topic budget
//!
//! Only the batch being rendered is held in memory.

mod cache;
mod render;

pub use cache::{CacheStats, FileContentCache};
pub use render::{FILE_TRUNCATED_MARKER, char_len, numbered_lines};

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::{BatchingConfig, ScanConfig};
use crate::scanner::{FileIndex, FileRecord, HashIndex};
use crate::selector::CATCH_ALL_TOPIC;

use render::{chunk_header, copies_line, file_header, read_window};

// =============================================================================
// Settings
// =============================================================================

/// Per-topic batching limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub chunk_size: u64,
    pub max_chunks_per_file: usize,
    pub max_chars_per_file: usize,
    pub char_budget: usize,
    pub max_candidates: usize,
}

impl BatchSettings {
    /// Settings for a topic; the catch-all topic gets the larger budget and cap
    pub fn for_topic(topic: &str, batching: &BatchingConfig, scan: &ScanConfig) -> Self {
        let catch_all = topic == CATCH_ALL_TOPIC;
        Self {
            batch_size: batching.batch_size.max(1),
            chunk_size: scan.chunk_size.max(1),
            max_chunks_per_file: batching.max_chunks_per_file,
            max_chars_per_file: batching.max_chars_per_file,
            char_budget: if catch_all {
                batching.catch_all_char_budget
            } else {
                batching.topic_char_budget
            },
            max_candidates: if catch_all {
                batching.max_catch_all_candidates
            } else {
                batching.max_candidates
            },
        }
    }
}

// =============================================================================
// Batch
// =============================================================================

/// One rendered batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBatch {
    /// `batch 2/5`
    pub label: String,
    /// 1-based position
    pub number: usize,
    pub total: usize,
    pub text: String,
    /// Files with at least their header emitted
    pub files: Vec<String>,
    /// Files skipped because identical content was already emitted
    pub skipped_duplicates: Vec<String>,
    /// The topic budget ran out inside this batch
    pub truncated: bool,
    pub char_count: usize,
    /// Latest modification time among emitted files
    pub latest_modified: Option<DateTime<Utc>>,
}

impl ContentBatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn note_file(&mut self, record: &FileRecord) {
        self.files.push(record.path.clone());
        self.latest_modified = self.latest_modified.max(record.modified);
    }
}

/// Appends pieces to a batch while the topic budget allows
struct BatchBuilder {
    batch: ContentBatch,
    remaining: usize,
}

impl BatchBuilder {
    fn push(&mut self, piece: &str) -> bool {
        if self.batch.truncated {
            return false;
        }
        let len = char_len(piece);
        if len > self.remaining {
            self.batch.truncated = true;
            return false;
        }
        self.remaining -= len;
        self.batch.char_count += len;
        self.batch.text.push_str(piece);
        true
    }
}

// =============================================================================
// Topic Batcher
// =============================================================================

/// Lazy batch sequence for one topic
pub struct TopicBatcher {
    topic: String,
    root: PathBuf,
    index: Arc<FileIndex>,
    hashes: Arc<HashIndex>,
    cache: Arc<FileContentCache>,
    settings: BatchSettings,
    groups: Vec<Vec<String>>,
    next: usize,
    seen_hashes: HashSet<String>,
    emitted_chars: usize,
    exhausted: bool,
    candidate_count: usize,
}

impl TopicBatcher {
    pub fn new(
        topic: impl Into<String>,
        root: impl Into<PathBuf>,
        index: Arc<FileIndex>,
        hashes: Arc<HashIndex>,
        cache: Arc<FileContentCache>,
        candidates: &[String],
        settings: BatchSettings,
    ) -> Self {
        let mut sorted: Vec<String> = candidates.to_vec();
        sorted.sort_by_key(|path| index.get(path).map(|r| r.size).unwrap_or(0));
        sorted.truncate(settings.max_candidates);

        let mut groups: Vec<Vec<String>> = sorted
            .chunks(settings.batch_size.max(1))
            .map(<[String]>::to_vec)
            .collect();
        if groups.is_empty() {
            groups.push(Vec::new());
        }

        Self {
            topic: topic.into(),
            root: root.into(),
            index,
            hashes,
            cache,
            settings,
            groups,
            next: 0,
            seen_hashes: HashSet::new(),
            emitted_chars: 0,
            exhausted: false,
            candidate_count: candidates.len(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of planned batches; fewer are produced when the budget runs out
    pub fn total_batches(&self) -> usize {
        self.groups.len()
    }

    /// Candidates before the size cap
    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    pub fn emitted_chars(&self) -> usize {
        self.emitted_chars
    }

    /// Render the next batch, or None when the sequence is over
    pub fn next_batch(&mut self) -> Option<ContentBatch> {
        if self.exhausted || self.next >= self.groups.len() {
            return None;
        }

        let number = self.next + 1;
        let total = self.groups.len();
        let paths = std::mem::take(&mut self.groups[self.next]);
        self.next += 1;

        let mut builder = BatchBuilder {
            batch: ContentBatch {
                label: format!("batch {}/{}", number, total),
                number,
                total,
                ..ContentBatch::default()
            },
            remaining: self.settings.char_budget.saturating_sub(self.emitted_chars),
        };

        let index = Arc::clone(&self.index);
        for path in &paths {
            let Some(record) = index.get(path) else {
                debug!(topic = %self.topic, "Candidate {} not in index", path);
                continue;
            };

            if let Some(hash) = &record.content_hash
                && self.seen_hashes.contains(hash)
            {
                builder.batch.skipped_duplicates.push(path.clone());
                continue;
            }

            if record.oversized {
                self.emit_chunks(record, &mut builder);
            } else {
                self.emit_file(record, &mut builder);
            }

            if builder.batch.truncated {
                break;
            }
        }

        let batch = builder.batch;
        self.emitted_chars += batch.char_count;
        if batch.truncated {
            debug!(
                topic = %self.topic,
                emitted = self.emitted_chars,
                budget = self.settings.char_budget,
                "Topic budget exhausted at {}",
                batch.label
            );
            self.exhausted = true;
        }
        Some(batch)
    }

    fn emit_file(&mut self, record: &FileRecord, builder: &mut BatchBuilder) {
        let content = match self
            .cache
            .get_or_load(&self.root, &record.path, record.modified)
        {
            Ok(content) => content,
            Err(e) => {
                debug!(topic = %self.topic, "Skipping unreadable {}: {}", record.path, e);
                return;
            }
        };

        if let Some(hash) = &record.content_hash {
            self.seen_hashes.insert(hash.clone());
        }

        if !builder.push(&file_header(record)) {
            return;
        }
        builder.batch.note_file(record);

        if let Some(hash) = &record.content_hash {
            let copies: Vec<&str> = self
                .hashes
                .paths(hash)
                .iter()
                .map(String::as_str)
                .filter(|p| *p != record.path)
                .collect();
            if !copies.is_empty() && !builder.push(&copies_line(&copies)) {
                return;
            }
        }

        let mut file_chars = 0;
        for line in numbered_lines(&content) {
            let len = char_len(&line);
            if file_chars + len > self.settings.max_chars_per_file {
                if !builder.push(FILE_TRUNCATED_MARKER) {
                    return;
                }
                break;
            }
            file_chars += len;
            if !builder.push(&line) {
                return;
            }
        }
        builder.push("\n");
    }

    fn emit_chunks(&mut self, record: &FileRecord, builder: &mut BatchBuilder) {
        let chunk_size = self.settings.chunk_size;
        let chunk_count = record
            .chunk_count
            .unwrap_or_else(|| record.size.div_ceil(chunk_size));
        let shown = chunk_count.min(self.settings.max_chunks_per_file as u64);
        let path = self.root.join(&record.path);

        for i in 0..shown {
            let start = i * chunk_size;
            let end = (start + chunk_size).min(record.size);
            let text = match read_window(&path, start, end - start) {
                Ok(text) => text,
                Err(e) => {
                    debug!(topic = %self.topic, "Chunk read failed for {}: {}", record.path, e);
                    return;
                }
            };

            if !builder.push(&chunk_header(record, i + 1, chunk_count, start, end)) {
                return;
            }
            if i == 0 {
                builder.batch.note_file(record);
            }
            for line in numbered_lines(&text) {
                if !builder.push(&line) {
                    return;
                }
            }
            if !builder.push("\n") {
                return;
            }
        }

        if chunk_count > shown {
            builder.push(&format!(
                "... [{} more chunks of {} not shown] ...\n\n",
                chunk_count - shown,
                record.path
            ));
        }
    }
}

impl Iterator for TopicBatcher {
    type Item = ContentBatch;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan_repository;
    use crate::selector::select_candidates;
    use proptest::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scan_config() -> ScanConfig {
        ScanConfig {
            hash_size_cap: 2_000,
            oversized_cap: 4_000,
            chunk_size: 1_000,
            ..ScanConfig::default()
        }
    }

    fn settings(budget: usize) -> BatchSettings {
        BatchSettings {
            batch_size: 2,
            chunk_size: 1_000,
            max_chunks_per_file: 2,
            max_chars_per_file: 10_000,
            char_budget: budget,
            max_candidates: 100,
        }
    }

    fn batcher_for(dir: &TempDir, topic: &str, settings: BatchSettings) -> TopicBatcher {
        let scan = scan_repository(dir.path(), &scan_config()).unwrap();
        let candidates = select_candidates(&scan.index);
        TopicBatcher::new(
            topic,
            dir.path(),
            Arc::new(scan.index.clone()),
            Arc::new(scan.hashes.clone()),
            Arc::new(FileContentCache::new()),
            candidates.get(topic),
            settings,
        )
    }

    #[test]
    fn test_settings_for_catch_all_topic() {
        let batching = BatchingConfig::default();
        let scan = ScanConfig::default();
        let normal = BatchSettings::for_topic("100", &batching, &scan);
        let catch_all = BatchSettings::for_topic(CATCH_ALL_TOPIC, &batching, &scan);
        assert_eq!(normal.char_budget, 200_000);
        assert_eq!(catch_all.char_budget, 300_000);
        assert_eq!(normal.max_candidates, 120);
        assert_eq!(catch_all.max_candidates, 200);
    }

    #[test]
    fn test_empty_candidate_list_yields_one_empty_batch() {
        let dir = TempDir::new().unwrap();
        let batches: Vec<ContentBatch> = batcher_for(&dir, "330", settings(1_000)).collect();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
        assert_eq!(batches[0].label, "batch 1/1");
    }

    #[test]
    fn test_small_files_first_and_line_numbered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "big.md", &"long line\n".repeat(20));
        write(dir.path(), "small.md", "one\ntwo\n");
        write(dir.path(), "mid.md", &"text\n".repeat(5));

        let batches: Vec<ContentBatch> =
            batcher_for(&dir, CATCH_ALL_TOPIC, settings(100_000)).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].files, vec!["small.md", "mid.md"]);
        assert_eq!(batches[1].files, vec!["big.md"]);
        assert!(batches[0].text.starts_with("--- small.md (Last modified: "));
        assert!(batches[0].text.contains("   1 | one\n   2 | two\n"));
        assert!(batches[0].latest_modified.is_some());
    }

    #[test]
    fn test_identical_content_is_emitted_once_per_topic() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "LICENSE", "MIT License\n");
        write(dir.path(), "pkg/LICENSE", "MIT License\n");
        write(dir.path(), "README.md", "# Demo\n");

        let batches: Vec<ContentBatch> =
            batcher_for(&dir, CATCH_ALL_TOPIC, settings(100_000)).collect();
        let emitted: Vec<&String> = batches.iter().flat_map(|b| &b.files).collect();
        let skipped: Vec<&String> = batches.iter().flat_map(|b| &b.skipped_duplicates).collect();

        let licenses = emitted.iter().filter(|p| p.ends_with("LICENSE")).count();
        assert_eq!(licenses, 1);
        assert_eq!(skipped.len(), 1);
        let all_text: String = batches.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(all_text.matches("MIT License").count(), 1);
        assert!(all_text.contains("(identical copies: "));
    }

    #[test]
    fn test_oversized_file_contributes_limited_chunks() {
        let dir = TempDir::new().unwrap();
        // 10_000 bytes with a 1_000 byte chunk size: 10 chunks, 2 shown
        let content: String = "0123456789\n".repeat(910).chars().take(10_000).collect();
        write(dir.path(), "server.log", &content);

        let batches: Vec<ContentBatch> =
            batcher_for(&dir, CATCH_ALL_TOPIC, settings(100_000)).collect();
        let text = &batches[0].text;
        assert!(text.contains("[chunk 1/10, bytes 0-1000]"));
        assert!(text.contains("[chunk 2/10, bytes 1000-2000]"));
        assert!(!text.contains("[chunk 3/10"));
        assert!(text.contains("8 more chunks of server.log not shown"));
        assert_eq!(text.matches("   1 | ").count(), 2);
    }

    #[test]
    fn test_per_file_char_cap() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.md", &"abcdefghij\n".repeat(100));
        let mut capped = settings(100_000);
        capped.max_chars_per_file = 200;

        let batch = batcher_for(&dir, CATCH_ALL_TOPIC, capped).next().unwrap();
        assert!(batch.text.contains(FILE_TRUNCATED_MARKER));
        assert!(!batch.truncated);
    }

    #[test]
    fn test_budget_exhaustion_stops_the_sequence() {
        let dir = TempDir::new().unwrap();
        for i in 0..6 {
            write(dir.path(), &format!("doc{i}.md"), &format!("lorem ipsum {i}\n").repeat(10));
        }
        let mut batcher = batcher_for(&dir, CATCH_ALL_TOPIC, settings(500));
        let batches: Vec<ContentBatch> = batcher.by_ref().collect();

        assert!(batches.len() < 3);
        assert!(batches.last().unwrap().truncated);
        assert!(batcher.emitted_chars() <= 500);
        let total: usize = batches.iter().map(|b| char_len(&b.text)).sum();
        assert_eq!(total, batcher.emitted_chars());
    }

    #[test]
    fn test_candidate_cap_keeps_smallest() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", &"x".repeat(50));
        write(dir.path(), "b.md", "y");
        write(dir.path(), "c.md", &"z".repeat(10));
        let mut capped = settings(100_000);
        capped.max_candidates = 2;

        let mut batcher = batcher_for(&dir, CATCH_ALL_TOPIC, capped);
        assert_eq!(batcher.candidate_count(), 3);
        assert_eq!(batcher.total_batches(), 1);
        let batch = batcher.next_batch().unwrap();
        assert_eq!(batch.files, vec!["b.md", "c.md"]);
    }

    #[test]
    fn test_sample_repository_scenario() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# Sample\n");
        write(dir.path(), "requirements.txt", "flask==3.0\n");
        write(dir.path(), "app.log", &"log line\n".repeat(1_000));
        write(dir.path(), "LICENSE", "Apache\n");
        write(dir.path(), "third_party/LICENSE", "Apache\n");

        let scan = scan_repository(dir.path(), &scan_config()).unwrap();
        let candidates = select_candidates(&scan.index);
        assert!(candidates.get("100").contains(&"README.md".to_string()));
        assert!(candidates.get("500").contains(&"requirements.txt".to_string()));

        let log = scan.index.get("app.log").unwrap();
        assert!(log.oversized);
        assert_eq!(log.chunk_count, Some(9));

        let batcher = TopicBatcher::new(
            CATCH_ALL_TOPIC,
            dir.path(),
            Arc::new(scan.index.clone()),
            Arc::new(scan.hashes.clone()),
            Arc::new(FileContentCache::new()),
            candidates.get(CATCH_ALL_TOPIC),
            settings(100_000),
        );
        let text: String = batcher.map(|b| b.text).collect();
        assert_eq!(text.matches("Apache").count(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_batches_never_exceed_budget(
            sizes in proptest::collection::vec(1usize..400, 1..8),
            budget in 50usize..2_000,
        ) {
            let dir = TempDir::new().unwrap();
            for (i, lines) in sizes.iter().enumerate() {
                write(dir.path(), &format!("f{i}.txt"), &"word\n".repeat(*lines));
            }
            let batcher = batcher_for(&dir, CATCH_ALL_TOPIC, settings(budget));
            let total: usize = batcher.map(|b| char_len(&b.text)).sum();
            prop_assert!(total <= budget);
        }
    }
}
