//! Unified error type for the build pipeline.
//!
//! Three tiers of failure exist here and only the first two produce a
//! `BuildError`:
//! - configuration errors (bad architecture token) abort before any
//!   external process runs, with a distinct exit code
//! - external step failures (git, configure, make, lipo, zip) propagate
//!   with their message, no retry
//! - missing optional libraries are not errors at all; they are the normal
//!   steady state and never surface past the probe layer

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(
        "Unsupported architecture token '{token}' (expected arm64, aarch64, x86_64, x64 or amd64)"
    )]
    UnsupportedArchitecture { token: String },

    #[error("Required tool '{tool}' not found on PATH")]
    MissingTool { tool: String },

    #[error("Missing {arch} build at {path} (build that architecture first)")]
    MissingArchBuild { arch: String, path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    /// Process exit code for this error. The unsupported-architecture path
    /// is distinguishable from everything else so wrapper scripts can tell
    /// a misconfiguration from a failed compile.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::UnsupportedArchitecture { .. } => 2,
            _ => 1,
        }
    }
}
