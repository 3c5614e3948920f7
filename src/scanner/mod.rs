//! Repository Scanner
//!
//! One traversal of the working tree produces:
//! - [`FileIndex`]: a [`FileRecord`] per visited file (size, mtime, text flag,
//!   content hash, oversized flag and chunk count)
//! - [`HashIndex`]: content hash → paths, for read-time deduplication
//! - a rendered directory tree
//!
//! No file content is retained.

mod classify;
mod file_index;
mod repo_scanner;
mod tree;

pub use classify::{MimeGuess, guess_mime, hash_file, is_text_file, sample_is_text};
pub use file_index::{FileIndex, FileRecord, HashIndex};
pub use repo_scanner::{RepoScanner, ScanResult, scan_repository};
pub use tree::render_tree;

#[cfg(test)]
pub(crate) use file_index::test_support;
