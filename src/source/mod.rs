//! Source fetching
//!
//! Resolves a repository identifier to a local checkout. Remote sources are
//! shallow-cloned with the `git` CLI; local directories are used in place.

mod repo_id;

pub use repo_id::RepoId;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::with_timeout_map;
use crate::constants::network;
use crate::types::{Result, WikiError};

const CLONE_PREFIX: &str = "repowiki-";

/// Branch and short commit of a checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutInfo {
    pub branch: String,
    pub commit: String,
}

impl CheckoutInfo {
    /// Reported when the checkout cannot be inspected
    pub fn unknown() -> Self {
        Self {
            branch: "unknown".to_string(),
            commit: "HEAD".to_string(),
        }
    }
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Make `source` available locally and return the checkout path
    async fn fetch(&self, source: &str, branch: Option<&str>) -> Result<PathBuf>;

    /// Branch and commit of a checkout; never fails
    async fn describe(&self, path: &Path) -> CheckoutInfo;

    /// Called once the run no longer needs the checkout
    async fn release(&self, _path: &Path) {}
}

/// `git`-subprocess fetcher
#[derive(Debug, Clone)]
pub struct GitFetcher {
    workdir: PathBuf,
    timeout: Duration,
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl GitFetcher {
    /// Clones land in `workdir/repowiki-<uuid>`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            timeout: Duration::from_secs(network::CLONE_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn clone_into(&self, source: &str, branch: Option<&str>, target: &Path) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["clone", "--depth", "1", "--single-branch"]);
        if let Some(branch) = branch {
            cmd.arg("--branch").arg(branch);
        }
        cmd.arg(source)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = with_timeout_map(self.timeout, cmd.output(), "git clone")
            .await?
            .map_err(|e| WikiError::Source(format!("Failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WikiError::Source(format!(
                "git clone {} failed: {}",
                source,
                stderr.trim()
            )));
        }
        Ok(())
    }

    async fn git_stdout(path: &Path, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

#[async_trait]
impl SourceFetcher for GitFetcher {
    async fn fetch(&self, source: &str, branch: Option<&str>) -> Result<PathBuf> {
        let local = Path::new(source);
        if local.is_dir() {
            debug!(path = %local.display(), "Using local directory as source");
            return Ok(local.canonicalize()?);
        }

        let target = self
            .workdir
            .join(format!("{}{}", CLONE_PREFIX, Uuid::new_v4().simple()));
        info!(
            source,
            branch = branch.unwrap_or("default"),
            target = %target.display(),
            "Cloning repository"
        );

        match self.clone_into(source, branch, &target).await {
            Ok(()) => Ok(target),
            Err(e) => {
                // git may leave a partial checkout behind on failure or timeout
                if target.exists()
                    && let Err(rm) = tokio::fs::remove_dir_all(&target).await
                {
                    warn!(path = %target.display(), "Failed to remove partial clone: {}", rm);
                }
                Err(e)
            }
        }
    }

    async fn describe(&self, path: &Path) -> CheckoutInfo {
        let branch = Self::git_stdout(path, &["rev-parse", "--abbrev-ref", "HEAD"]).await;
        let commit = Self::git_stdout(path, &["rev-parse", "--short=7", "HEAD"]).await;

        match (branch, commit) {
            // A detached head has no active branch
            (Some(branch), Some(commit)) if branch != "HEAD" => CheckoutInfo { branch, commit },
            _ => {
                warn!(path = %path.display(), "Could not determine branch/commit info");
                CheckoutInfo::unknown()
            }
        }
    }

    /// Removes clones this fetcher created; anything else is left alone
    async fn release(&self, path: &Path) {
        let owned = path.parent() == Some(self.workdir.as_path())
            && path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(CLONE_PREFIX));
        if !owned {
            return;
        }
        if let Err(e) = tokio::fs::remove_dir_all(path).await {
            warn!(path = %path.display(), "Failed to remove clone: {}", e);
        } else {
            debug!(path = %path.display(), "Removed clone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_directory_is_used_directly() {
        let dir = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(dir.path());
        let path = fetcher
            .fetch(dir.path().to_str().unwrap(), None)
            .await
            .unwrap();
        assert_eq!(path, dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_describe_non_repository_falls_back() {
        let dir = TempDir::new().unwrap();
        let info = GitFetcher::default().describe(dir.path()).await;
        assert_eq!(info, CheckoutInfo::unknown());
    }

    #[tokio::test]
    async fn test_release_only_removes_own_clones() {
        let dir = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(dir.path());
        let clone = dir.path().join("repowiki-0123abcd");
        let user_dir = dir.path().join("project");
        std::fs::create_dir_all(&clone).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        fetcher.release(&user_dir).await;
        fetcher.release(&clone).await;

        assert!(user_dir.exists());
        assert!(!clone.exists());
    }

    #[tokio::test]
    async fn test_clone_failure_is_source_error() {
        let dir = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(dir.path()).with_timeout(Duration::from_secs(30));
        let missing = dir.path().join("no-such-repo.git");
        let result = fetcher
            .fetch(&format!("file://{}", missing.display()), None)
            .await;
        assert!(result.is_err());

        // No partial clone survives the failure
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(CLONE_PREFIX))
            .count();
        assert_eq!(leftovers, 0);
    }
}
