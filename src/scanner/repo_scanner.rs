use ignore::{DirEntry, WalkBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::classify::{hash_file, is_text_file};
use super::file_index::{FileIndex, FileRecord, HashIndex};
use super::tree::render_tree;
use crate::config::ScanConfig;
use crate::constants::scan::{ALLOWED_DOT_ENTRIES, IGNORED_DIRS};
use crate::types::{Result, WikiError};

/// Everything a single scan produces
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub root: PathBuf,
    pub index: FileIndex,
    pub hashes: HashIndex,
    pub tree: String,
}

/// Single-pass repository walker.
///
/// Visits entries in file-name order, prunes ignored directories before
/// descent, never follows symlinks and does not consult `.gitignore`.
pub struct RepoScanner {
    root: PathBuf,
    config: ScanConfig,
    exclude: Vec<glob::Pattern>,
}

impl RepoScanner {
    pub fn new<P: AsRef<Path>>(root: P, config: &ScanConfig) -> Self {
        let exclude = config
            .exclude
            .iter()
            .filter_map(|pattern| match glob::Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        Self {
            root: root.as_ref().to_path_buf(),
            config: config.clone(),
            exclude,
        }
    }

    pub fn scan(&self) -> Result<ScanResult> {
        self.check_root()?;

        let ignored: Arc<HashSet<String>> = Arc::new(
            IGNORED_DIRS
                .iter()
                .map(|d| d.to_string())
                .chain(self.config.extra_ignore_dirs.iter().cloned())
                .collect(),
        );

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| keep_entry(entry, &ignored))
            .build();

        let mut index = FileIndex::new();
        let mut hashes = HashIndex::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let Some(rel_path) = relative_path(&self.root, entry.path()) else {
                continue;
            };

            if self.exclude.iter().any(|p| p.matches(&rel_path)) {
                continue;
            }

            if index.len() >= self.config.max_files {
                warn!(
                    "File ceiling of {} reached, scan truncated",
                    self.config.max_files
                );
                index.mark_truncated();
                break;
            }

            let record = self.build_record(&entry, rel_path);
            if let Some(hash) = &record.content_hash {
                hashes.insert(hash.clone(), record.path.clone());
            }
            index.push(record);
        }

        let tree = render_tree(
            &root_label(&self.root),
            &index,
            self.config.tree_depth,
        );

        info!(
            files = index.len(),
            text_files = index.text_count(),
            unique_hashes = hashes.len(),
            truncated = index.is_truncated(),
            "Scan complete"
        );

        Ok(ScanResult {
            root: self.root.clone(),
            index,
            hashes,
            tree,
        })
    }

    fn check_root(&self) -> Result<()> {
        let meta = fs::metadata(&self.root).map_err(|e| WikiError::scan_root(&self.root, e))?;
        if !meta.is_dir() {
            return Err(WikiError::scan_root(&self.root, "not a directory"));
        }
        fs::read_dir(&self.root).map_err(|e| WikiError::scan_root(&self.root, e))?;
        Ok(())
    }

    /// Stat once, classify, fingerprint. Per-file failures leave the hash empty.
    fn build_record(&self, entry: &DirEntry, path: String) -> FileRecord {
        let extension = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let metadata = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                debug!("Stat failed for {}: {}", path, e);
                return FileRecord {
                    path,
                    size: 0,
                    modified: None,
                    extension,
                    is_text: false,
                    content_hash: None,
                    oversized: false,
                    chunk_count: None,
                };
            }
        };

        let size = metadata.len();
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        let is_text = is_text_file(entry.path(), extension.as_deref());
        let oversized = size > self.config.oversized_cap;
        let chunk_count = oversized.then(|| size.div_ceil(self.config.chunk_size.max(1)));

        let content_hash = if is_text && size <= self.config.hash_size_cap {
            match hash_file(entry.path()) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    debug!("Hashing failed for {}: {}", path, e);
                    None
                }
            }
        } else {
            None
        };

        FileRecord {
            path,
            size,
            modified,
            extension,
            is_text,
            content_hash,
            oversized,
            chunk_count,
        }
    }
}

/// Convenience wrapper: scan `root` with the given settings
pub fn scan_repository<P: AsRef<Path>>(root: P, config: &ScanConfig) -> Result<ScanResult> {
    RepoScanner::new(root, config).scan()
}

fn keep_entry(entry: &DirEntry, ignored: &HashSet<String>) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());

    if is_dir && ignored.contains(name.as_ref()) {
        return false;
    }
    if name.starts_with('.') && !ALLOWED_DOT_ENTRIES.contains(&name.as_ref()) {
        return false;
    }
    true
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn root_label(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| root.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn small_config() -> ScanConfig {
        ScanConfig {
            hash_size_cap: 1024,
            oversized_cap: 4096,
            chunk_size: 1000,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn test_scan_builds_index_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.py", b"print('hi')\n");
        write(dir.path(), "README.md", b"# Demo\n");
        write(dir.path(), "requirements.txt", b"flask==3.0\n");

        let result = scan_repository(dir.path(), &small_config()).unwrap();
        let paths: Vec<&str> = result.index.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "requirements.txt", "src/main.py"]);
        assert!(result.index.iter().all(|r| r.is_text && r.content_hash.is_some()));
        assert!(!result.index.is_truncated());
    }

    #[test]
    fn test_scan_prunes_ignored_and_dot_entries() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/lib/index.js", b"x");
        write(dir.path(), ".git/HEAD", b"ref");
        write(dir.path(), ".hidden/notes.md", b"secret");
        write(dir.path(), ".env.local", b"KEY=1");
        write(dir.path(), ".github/workflows/ci.yml", b"on: push\n");
        write(dir.path(), ".gitlab-ci.yml", b"stages: []\n");
        write(dir.path(), "generated/out.txt", b"keep");

        let config = ScanConfig {
            extra_ignore_dirs: vec!["generated".to_string()],
            ..small_config()
        };
        let result = scan_repository(dir.path(), &config).unwrap();
        let paths: Vec<&str> = result.index.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec![".github/workflows/ci.yml", ".gitlab-ci.yml"]);
    }

    #[test]
    fn test_scan_exclude_patterns() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/a.md", b"a");
        write(dir.path(), "src/lib.rs", b"b");

        let config = ScanConfig {
            exclude: vec!["docs/*".to_string()],
            ..small_config()
        };
        let result = scan_repository(dir.path(), &config).unwrap();
        assert!(result.index.contains("src/lib.rs"));
        assert!(!result.index.contains("docs/a.md"));
    }

    #[test]
    fn test_duplicate_files_share_hash() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "LICENSE", b"MIT License\n");
        write(dir.path(), "pkg/LICENSE", b"MIT License\n");
        write(dir.path(), "NOTICE", b"Other\n");

        let result = scan_repository(dir.path(), &small_config()).unwrap();
        let hash = result.index.get("LICENSE").unwrap().content_hash.clone().unwrap();
        assert_eq!(
            result.index.get("pkg/LICENSE").unwrap().content_hash.as_deref(),
            Some(hash.as_str())
        );
        assert_eq!(result.hashes.paths(&hash), ["LICENSE", "pkg/LICENSE"]);
        assert_eq!(result.hashes.duplicate_groups().count(), 1);
    }

    #[test]
    fn test_binary_and_oversized_files_are_not_hashed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "image.png", b"\x89PNG\r\n");
        write(dir.path(), "blob", &[0u8, 159, 146, 150]);
        write(dir.path(), "medium.log", "m".repeat(2000).as_bytes());
        write(dir.path(), "huge.log", "line\n".repeat(2000).as_bytes());

        let result = scan_repository(dir.path(), &small_config()).unwrap();

        let image = result.index.get("image.png").unwrap();
        assert!(!image.is_text && image.content_hash.is_none());
        let blob = result.index.get("blob").unwrap();
        assert!(!blob.is_text && blob.content_hash.is_none());

        // Above the hash cap but below the oversized cap
        let medium = result.index.get("medium.log").unwrap();
        assert!(medium.is_text && !medium.oversized && medium.content_hash.is_none());

        let huge = result.index.get("huge.log").unwrap();
        assert!(huge.is_text && huge.oversized);
        assert_eq!(huge.size, 10_000);
        assert_eq!(huge.chunk_count, Some(10));
        assert!(huge.content_hash.is_none());
    }

    #[test]
    fn test_zero_chunk_size_counts_bytes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "big.log", "x".repeat(100).as_bytes());
        let config = ScanConfig {
            oversized_cap: 10,
            chunk_size: 0,
            ..small_config()
        };
        let result = scan_repository(dir.path(), &config).unwrap();
        let big = result.index.get("big.log").unwrap();
        assert!(big.oversized);
        assert_eq!(big.chunk_count, Some(100));
    }

    #[test]
    fn test_file_ceiling_truncates() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            write(dir.path(), &format!("f{i}.txt"), b"x");
        }
        let config = ScanConfig {
            max_files: 3,
            ..small_config()
        };
        let result = scan_repository(dir.path(), &config).unwrap();
        assert_eq!(result.index.len(), 3);
        assert!(result.index.is_truncated());
        assert!(result.tree.contains("truncated"));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = scan_repository(dir.path().join("nope"), &small_config()).unwrap_err();
        assert!(matches!(err, WikiError::ScanRoot { .. }));
        assert!(err.is_fatal());

        write(dir.path(), "file.txt", b"x");
        let err = scan_repository(dir.path().join("file.txt"), &small_config()).unwrap_err();
        assert!(matches!(err, WikiError::ScanRoot { .. }));
    }

    #[test]
    fn test_rescan_is_identical() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b/x.rs", b"fn x() {}");
        write(dir.path(), "a.md", b"# a");
        let first = scan_repository(dir.path(), &small_config()).unwrap();
        let second = scan_repository(dir.path(), &small_config()).unwrap();
        assert_eq!(first.index.records(), second.index.records());
        assert_eq!(first.tree, second.tree);
    }
}
