//! Filesystem helpers shared by the build pipeline.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// 安全地创建目录（包括父目录）
///
/// 如果目录已存在则不报错，自动创建所有必需的父目录。
pub fn ensure_dir_exists(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// Make a path absolute against the current working directory.
///
/// Relative paths in configure args break once make changes directories, so
/// every path entering the flag list goes through here first.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

/// Move a directory aside under a numeric suffix, returning the new path.
///
/// Used when a checkout directory exists but points at the wrong upstream:
/// the stale tree is preserved as `<name>.stale-<N>` rather than deleted.
pub fn move_aside(dir: &Path) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Cannot move aside path without a name: {}", dir.display()))?;
    let parent = dir
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Cannot move aside path without a parent: {}", dir.display()))?;

    for n in 1..1000u32 {
        let candidate = parent.join(format!("{}.stale-{}", name, n));
        if !candidate.exists() {
            std::fs::rename(dir, &candidate).with_context(|| {
                format!(
                    "Failed to move {} aside to {}",
                    dir.display(),
                    candidate.display()
                )
            })?;
            return Ok(candidate);
        }
    }

    anyhow::bail!("Too many stale copies next to {}", dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dir_exists_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir_exists(&nested).unwrap();
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_absolutize_keeps_absolute() {
        let p = Path::new("/opt/homebrew");
        assert_eq!(absolutize(p).unwrap(), PathBuf::from("/opt/homebrew"));
    }

    #[test]
    fn test_move_aside_preserves_contents() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("ffmpeg");
        std::fs::create_dir(&stale).unwrap();
        std::fs::write(stale.join("marker"), "x").unwrap();

        let moved = move_aside(&stale).unwrap();

        assert!(!stale.exists());
        assert_eq!(moved, dir.path().join("ffmpeg.stale-1"));
        assert!(moved.join("marker").exists());
    }

    #[test]
    fn test_move_aside_increments_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ffmpeg.stale-1")).unwrap();
        let stale = dir.path().join("ffmpeg");
        std::fs::create_dir(&stale).unwrap();

        let moved = move_aside(&stale).unwrap();
        assert_eq!(moved, dir.path().join("ffmpeg.stale-2"));
    }
}
