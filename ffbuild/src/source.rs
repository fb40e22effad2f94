//! FFmpeg source tree management.
//!
//! The checkout directory is reused across runs, so it has to be validated
//! before use: a directory that is not a git checkout of the expected
//! upstream (a manual copy, a clone of a fork, an aborted earlier run) is
//! moved aside under a stale suffix and replaced by a fresh clone. Nothing
//! is ever deleted.

use anyhow::{Context, Result};
use shared_utils::command::{run_checked, run_streamed};
use shared_utils::fsutil::move_aside;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

pub const FFMPEG_REPO_URL: &str = "https://git.ffmpeg.org/ffmpeg.git";

/// Seam for the source-fetch step so the pipeline can be driven without
/// network access.
pub trait SourceRepository {
    /// Make sure a checkout of the requested branch exists and is current,
    /// returning its path.
    fn ensure_checkout(&self, branch: &str) -> Result<PathBuf>;
}

/// Real fetcher shelling out to git.
pub struct GitSource {
    checkout_dir: PathBuf,
    repo_url: String,
}

impl GitSource {
    pub fn new(checkout_dir: PathBuf) -> Self {
        Self {
            checkout_dir,
            repo_url: FFMPEG_REPO_URL.to_string(),
        }
    }

    pub fn with_repo_url(checkout_dir: PathBuf, repo_url: impl Into<String>) -> Self {
        Self {
            checkout_dir,
            repo_url: repo_url.into(),
        }
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// True iff the directory is a git checkout whose origin matches the
    /// expected upstream. Any git failure (not a repo, no origin remote)
    /// counts as a mismatch.
    fn origin_matches(&self) -> bool {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.checkout_dir)
            .args(["remote", "get-url", "origin"]);

        match run_checked(&mut cmd, "git remote get-url") {
            Ok(output) => {
                let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
                url == self.repo_url
            }
            Err(_) => false,
        }
    }

    fn clone_fresh(&self, branch: &str) -> Result<()> {
        info!(url = %self.repo_url, branch, "Cloning FFmpeg");
        let mut cmd = Command::new("git");
        cmd.args(["clone", "--branch", branch])
            .arg(&self.repo_url)
            .arg(&self.checkout_dir);
        run_streamed(&mut cmd, "git clone")
    }

    fn update(&self, branch: &str) -> Result<()> {
        info!(branch, dir = %self.checkout_dir.display(), "Updating existing checkout");

        let mut fetch = Command::new("git");
        fetch
            .arg("-C")
            .arg(&self.checkout_dir)
            .args(["fetch", "--tags", "origin"]);
        run_streamed(&mut fetch, "git fetch")?;

        let mut checkout = Command::new("git");
        checkout
            .arg("-C")
            .arg(&self.checkout_dir)
            .args(["checkout", branch]);
        run_streamed(&mut checkout, "git checkout")?;

        // Fast-forward only when the target is a branch; tags and raw
        // commits have nothing to merge.
        let mut verify = Command::new("git");
        verify
            .arg("-C")
            .arg(&self.checkout_dir)
            .args(["rev-parse", "--verify", "--quiet"])
            .arg(format!("origin/{}", branch));
        if shared_utils::command::run_quiet_status(&mut verify) {
            let mut merge = Command::new("git");
            merge
                .arg("-C")
                .arg(&self.checkout_dir)
                .args(["merge", "--ff-only"])
                .arg(format!("origin/{}", branch));
            run_streamed(&mut merge, "git merge --ff-only")?;
        }

        Ok(())
    }
}

impl SourceRepository for GitSource {
    fn ensure_checkout(&self, branch: &str) -> Result<PathBuf> {
        if self.checkout_dir.exists() {
            if self.origin_matches() {
                self.update(branch)
                    .context("Failed to update FFmpeg checkout")?;
                return Ok(self.checkout_dir.clone());
            }

            let moved = move_aside(&self.checkout_dir)?;
            warn!(
                from = %self.checkout_dir.display(),
                to = %moved.display(),
                "Checkout does not match upstream, moved aside"
            );
        }

        self.clone_fresh(branch)
            .context("Failed to clone FFmpeg")?;
        Ok(self.checkout_dir.clone())
    }
}

/// Test fetcher that hands back a fixed directory.
#[cfg(test)]
pub struct FixedSource(pub PathBuf);

#[cfg(test)]
impl SourceRepository for FixedSource {
    fn ensure_checkout(&self, _branch: &str) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}
