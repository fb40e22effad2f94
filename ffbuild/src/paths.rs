//! Build directory layout.
//!
//! All paths derive from one root anchor plus overrides; nothing here is
//! persistent state, the layout is recomputed on every invocation.

use anyhow::Result;
use serde::Serialize;
use shared_utils::fsutil::{absolutize, ensure_dir_exists};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct BuildPaths {
    pub root_dir: PathBuf,
    pub work_dir: PathBuf,
    pub source_dir: PathBuf,
    /// FFmpeg checkout inside the source dir.
    pub ffmpeg_dir: PathBuf,
    pub output_dir: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl BuildPaths {
    pub fn resolve(root: &Path, out_override: Option<&Path>, tag: &str) -> Result<Self> {
        let root_dir = absolutize(root)?;
        let work_dir = root_dir.join("work");
        let source_dir = work_dir.join("src");
        let ffmpeg_dir = source_dir.join("ffmpeg");
        let output_dir = resolve_output_dir(out_override, &work_dir, tag);
        let artifacts_dir = root_dir.join("artifacts");

        Ok(Self {
            root_dir,
            work_dir,
            source_dir,
            ffmpeg_dir,
            output_dir,
            artifacts_dir,
        })
    }

    /// Create every directory the pipeline writes into. Idempotent; an
    /// interrupted run can simply be re-run.
    pub fn create_dirs(&self) -> Result<()> {
        ensure_dir_exists(&self.work_dir)?;
        ensure_dir_exists(&self.source_dir)?;
        ensure_dir_exists(&self.output_dir)?;
        ensure_dir_exists(&self.artifacts_dir)?;
        Ok(())
    }

    /// Install tree for a given output tag under the default layout.
    /// Universal merging needs both per-arch trees regardless of which
    /// architecture the current invocation targeted.
    pub fn arch_output_dir(&self, tag: &str) -> PathBuf {
        self.work_dir.join(format!("out-{}", tag))
    }
}

/// An explicit override is used verbatim; otherwise the output lands in
/// `work_dir/out-<tag>`.
pub fn resolve_output_dir(out_override: Option<&Path>, work_dir: &Path, tag: &str) -> PathBuf {
    match out_override {
        Some(p) => p.to_path_buf(),
        None => work_dir.join(format!("out-{}", tag)),
    }
}
