//! File index types produced by a repository scan.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One scanned file. Immutable after the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Root-relative path with `/` separators
    pub path: String,
    pub size: u64,
    /// None when the file could not be stat'ed
    pub modified: Option<DateTime<Utc>>,
    pub extension: Option<String>,
    pub is_text: bool,
    /// SHA-256 hex digest, only for text files within the hash cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    pub oversized: bool,
    /// Number of chunks, only for oversized files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u64>,
}

impl FileRecord {
    /// `YYYY-MM-DD HH:MM`, or `unknown` when the mtime is missing
    pub fn modified_label(&self) -> String {
        self.modified
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Lowercased path used by topic rules
    pub fn lower_path(&self) -> String {
        self.path.to_lowercase()
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// All records of a scan, in traversal order, with O(1) lookup by path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileIndex {
    records: Vec<FileRecord>,
    #[serde(skip)]
    by_path: HashMap<String, usize>,
    /// Set when the file ceiling stopped the scan early
    truncated: bool,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Paths are unique keys; a repeated path replaces the
    /// earlier record in place.
    pub fn push(&mut self, record: FileRecord) {
        if let Some(&idx) = self.by_path.get(&record.path) {
            self.records[idx] = record;
            return;
        }
        self.by_path.insert(record.path.clone(), self.records.len());
        self.records.push(record);
    }

    pub fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.by_path.get(path).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn text_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_text).count()
    }

    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }
}

impl FromIterator<FileRecord> for FileIndex {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut index = FileIndex::new();
        for record in iter {
            index.push(record);
        }
        index
    }
}

/// Content hash → paths sharing that hash, in traversal order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct HashIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: impl Into<String>, path: impl Into<String>) {
        self.entries.entry(hash.into()).or_default().push(path.into());
    }

    pub fn paths(&self, hash: &str) -> &[String] {
        self.entries.get(hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups of two or more byte-identical files
    pub fn duplicate_groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(hash, paths)| (hash.as_str(), paths.as_slice()))
    }

    /// Number of distinct hashes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A text record with the given size and no hash
    pub fn text_record(path: &str, size: u64) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            size,
            modified: None,
            extension: path
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_lowercase())
                .filter(|ext| !ext.contains('/')),
            is_text: true,
            content_hash: None,
            oversized: false,
            chunk_count: None,
        }
    }
}
