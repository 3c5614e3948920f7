//! Global Constants
//!
//! Tuning defaults for scanning, batching and generation. Most of them can be
//! overridden through [`crate::config::Config`].

/// Repository scanner constants
pub mod scan {
    /// Text files up to this size are fingerprinted (1 MiB)
    pub const HASH_SIZE_CAP: u64 = 1024 * 1024;

    /// Files above this size are read in chunks only (2 MiB)
    pub const OVERSIZED_CAP: u64 = 2 * 1024 * 1024;

    /// Chunk size used for oversized files (128 KiB)
    pub const CHUNK_SIZE: u64 = 128 * 1024;

    /// Global file ceiling for pathological trees
    pub const MAX_FILES: usize = 20_000;

    /// Bytes sampled when sniffing whether a file is text
    pub const SNIFF_SAMPLE_BYTES: usize = 8 * 1024;

    /// Read buffer for streaming SHA-256
    pub const HASH_BUFFER_BYTES: usize = 64 * 1024;

    /// Directory tree rendering depth
    pub const TREE_DEPTH: usize = 3;

    /// Directories listing more files than this are collapsed in the tree
    pub const TREE_MAX_FILES_PER_DIR: usize = 50;

    /// Directory names pruned before descent
    pub const IGNORED_DIRS: &[&str] = &[
        "node_modules",
        "target",
        "build",
        "dist",
        "out",
        "venv",
        ".venv",
        "env",
        ".env",
        "virtualenv",
        "__pycache__",
        ".pytest_cache",
        ".mypy_cache",
        ".git",
        ".svn",
        ".hg",
        ".idea",
        ".vscode",
        ".settings",
        "vendor",
        "bower_components",
        "jspm_packages",
        "bin",
        "obj",
        "tmp",
        "temp",
        "logs",
        "coverage",
    ];

    /// Dot entries that are still scanned
    pub const ALLOWED_DOT_ENTRIES: &[&str] = &[".github", ".gitlab", ".gitlab-ci.yml", ".circleci"];
}

/// Content batcher constants
pub mod batching {
    /// Files per batch
    pub const BATCH_SIZE: usize = 20;

    /// Chunks read from the head of an oversized file
    pub const MAX_CHUNKS_PER_FILE: usize = 3;

    /// Character cap for a single non-oversized file
    pub const MAX_CHARS_PER_FILE: usize = 20_000;

    /// Character budget per topic
    pub const TOPIC_CHAR_BUDGET: usize = 200_000;

    /// Character budget for the catch-all topic
    pub const CATCH_ALL_CHAR_BUDGET: usize = 300_000;

    /// Candidates kept per topic, smallest first
    pub const MAX_CANDIDATES: usize = 120;

    /// Candidates kept for the catch-all topic
    pub const MAX_CATCH_ALL_CANDIDATES: usize = 200;
}

/// Generation orchestrator constants
pub mod generation {
    /// Concurrent synthesis calls
    pub const CONCURRENCY: usize = 4;

    /// Characters of the running draft included in the next batch prompt
    pub const DRAFT_EXCERPT_CHARS: usize = 8_000;

    /// Records listed in the overview inventory
    pub const OVERVIEW_MAX_FILES: usize = 2_000;

    /// Characters of generated documents passed to the overview
    pub const OVERVIEW_DOCS_CHARS: usize = 8_000;

    /// Characters of generated documents passed to the index sections call
    pub const INDEX_DOCS_CHARS: usize = 4_000;

    /// Output root for generated documentation
    pub const OUTPUT_DIR: &str = "generated-docs";
}

/// Network constants
pub mod network {
    /// Default synthesis timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Retries after the first attempt (0 = single shot)
    pub const DEFAULT_MAX_RETRIES: usize = 0;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Clone timeout (seconds)
    pub const CLONE_TIMEOUT_SECS: u64 = 600;
}
