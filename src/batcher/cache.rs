//! File Content Cache
//!
//! Run-scoped cache of file contents keyed by (path, modification time).
//! Shared by reference across concurrently running topic batchers and
//! dropped when the run ends.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type CacheKey = (String, Option<DateTime<Utc>>);

/// Concurrent file content cache
#[derive(Debug, Default)]
pub struct FileContentCache {
    entries: DashMap<CacheKey, Arc<str>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Cache hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl FileContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the content of `root/rel_path`, reading it on first use.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn get_or_load(
        &self,
        root: &Path,
        rel_path: &str,
        modified: Option<DateTime<Utc>>,
    ) -> std::io::Result<Arc<str>> {
        let key = (rel_path.to_string(), modified);
        if let Some(content) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(content.value()));
        }

        let bytes = std::fs::read(root.join(rel_path))?;
        let content: Arc<str> = Arc::from(String::from_utf8_lossy(&bytes).as_ref());
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(key, Arc::clone(&content));
        Ok(content)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_second_read_hits_cache() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let cache = FileContentCache::new();

        let first = cache.get_or_load(dir.path(), "a.txt", None).unwrap();
        // Content on disk changes but the key is the same
        fs::write(dir.path().join("a.txt"), "changed").unwrap();
        let second = cache.get_or_load(dir.path(), "a.txt", None).unwrap();

        assert_eq!(&*first, "hello");
        assert_eq!(&*second, "hello");
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_mtime_is_a_new_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "v1").unwrap();
        let cache = FileContentCache::new();
        cache.get_or_load(dir.path(), "a.txt", None).unwrap();

        fs::write(dir.path().join("a.txt"), "v2").unwrap();
        let later = Some(Utc::now());
        let content = cache.get_or_load(dir.path(), "a.txt", later).unwrap();
        assert_eq!(&*content, "v2");
        assert_eq!(cache.stats().entries, 2);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = FileContentCache::new();
        assert!(cache.get_or_load(dir.path(), "missing.txt", None).is_err());
        assert_eq!(cache.stats().entries, 0);
    }
}
