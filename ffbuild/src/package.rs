//! Packaging: universal-binary merge and zip artifacts.
//!
//! Both operations delegate to Apple's tools (`lipo`, `zip`); this module
//! only decides what gets merged and where artifacts land.

use crate::error::BuildError;
use crate::paths::BuildPaths;
use anyhow::{Context, Result};
use shared_utils::command::run_checked;
use shared_utils::fsutil::ensure_dir_exists;
use shared_utils::tools::require_tool;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// Executables the install step produces and the merge step combines.
pub const MERGED_BINARIES: &[&str] = &["ffmpeg", "ffprobe"];

/// Output tag used for the merged tree and its artifact.
pub const UNIVERSAL_TAG: &str = "universal";

/// Merge the arm64 and x64 install trees into a universal one.
///
/// Requires both per-arch builds to exist under the default layout; a
/// missing side is a hard error naming the path to build first.
pub fn merge_universal(paths: &BuildPaths) -> Result<PathBuf> {
    require_tool("lipo").map_err(|_| BuildError::MissingTool {
        tool: "lipo".to_string(),
    })?;

    let arm64_bin = paths.arch_output_dir("arm64").join("bin");
    let x64_bin = paths.arch_output_dir("x64").join("bin");
    let universal_dir = paths.arch_output_dir(UNIVERSAL_TAG);
    let universal_bin = universal_dir.join("bin");
    ensure_dir_exists(&universal_bin)?;

    info!(
        arm64 = %arm64_bin.display(),
        x64 = %x64_bin.display(),
        "Merging universal binaries"
    );

    for name in MERGED_BINARIES {
        let arm64 = arm64_bin.join(name);
        let x64 = x64_bin.join(name);
        let merged = universal_bin.join(name);

        for (arch, path) in [("arm64", &arm64), ("x64", &x64)] {
            if !path.exists() {
                return Err(BuildError::MissingArchBuild {
                    arch: arch.to_string(),
                    path: path.clone(),
                }
                .into());
            }
        }

        let mut cmd = Command::new("lipo");
        cmd.arg("-create")
            .arg(&arm64)
            .arg(&x64)
            .arg("-output")
            .arg(&merged);
        run_checked(&mut cmd, "lipo -create")
            .with_context(|| format!("Failed to merge {}", name))?;

        // Confirm both slices made it in.
        let mut verify = Command::new("lipo");
        verify.arg("-info").arg(&merged);
        let output = run_checked(&mut verify, "lipo -info")?;
        info!(
            binary = name,
            info = %String::from_utf8_lossy(&output.stdout).trim(),
            "Merged"
        );
    }

    Ok(universal_dir)
}

/// Zip an install tree into the artifacts directory, returning the archive
/// path. Archive name embeds the architecture tag.
pub fn zip_output(dir: &Path, tag: &str, artifacts_dir: &Path) -> Result<PathBuf> {
    require_tool("zip").map_err(|_| BuildError::MissingTool {
        tool: "zip".to_string(),
    })?;

    ensure_dir_exists(artifacts_dir)?;
    let archive = artifacts_dir.join(artifact_name(tag));

    // A leftover archive from an earlier run would be appended to.
    if archive.exists() {
        std::fs::remove_file(&archive)
            .with_context(|| format!("Failed to remove old archive {}", archive.display()))?;
    }

    info!(dir = %dir.display(), archive = %archive.display(), "Zipping output");

    let mut cmd = Command::new("zip");
    cmd.args(["-r", "-y"]).arg(&archive).arg(".").current_dir(dir);
    run_checked(&mut cmd, "zip")?;

    Ok(archive)
}

/// Fixed artifact naming pattern.
pub fn artifact_name(tag: &str) -> String {
    format!("ffmpeg-macos-{}.zip", tag)
}
