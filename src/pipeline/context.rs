//! Run-scoped, read-only state shared by every generation task.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::scanner::{FileIndex, HashIndex, ScanResult};
use crate::selector::{CandidateMap, select_candidates};
use crate::source::{CheckoutInfo, RepoId};

/// Immutable metadata and indexes for one run
#[derive(Debug)]
pub struct RunContext {
    pub run_id: String,
    pub repo: RepoId,
    pub branch: String,
    pub commit: String,
    pub checkout: PathBuf,
    pub index: Arc<FileIndex>,
    pub hashes: Arc<HashIndex>,
    pub candidates: CandidateMap,
    /// Rendered directory tree
    pub tree: String,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    /// Build the context from a finished scan; selects candidates once
    pub fn new(repo: RepoId, checkout: CheckoutInfo, scan: ScanResult) -> Self {
        let candidates = select_candidates(&scan.index);
        Self {
            run_id: Uuid::new_v4().to_string(),
            repo,
            branch: checkout.branch,
            commit: checkout.commit,
            checkout: scan.root,
            index: Arc::new(scan.index),
            hashes: Arc::new(scan.hashes),
            candidates,
            tree: scan.tree,
            started_at: Utc::now(),
        }
    }

    pub fn repo_name(&self) -> &str {
        self.repo.name()
    }

    pub fn root(&self) -> &Path {
        &self.checkout
    }
}
