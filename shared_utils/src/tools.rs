//! External tools detection.
//!
//! The orchestrator delegates all real work to host tools. Required tools
//! abort the run before any build step; optional tools degrade features.

use anyhow::Result;
use log::info;
use std::path::PathBuf;

/// Tools without which no build can proceed.
pub const REQUIRED_TOOLS: &[&str] = &["git", "make", "pkg-config"];

/// Result of a host tool scan.
#[derive(Debug, Clone)]
pub struct ToolCheck {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl ToolCheck {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// Look up a single tool on PATH.
pub fn optional_tool(name: &str) -> ToolCheck {
    let path = which::which(name).ok();
    match &path {
        Some(p) => info!("Found {}: {}", name, p.display()),
        None => info!("{} not found on PATH", name),
    }
    ToolCheck {
        name: name.to_string(),
        path,
    }
}

/// Look up a tool that must exist, failing otherwise.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| {
        anyhow::anyhow!(
            "Required tool '{}' not found on PATH. Install it (e.g. via Xcode \
             command line tools or Homebrew) and re-run.",
            name
        )
    })
}

/// Verify every required tool exists before any external step runs.
pub fn check_required_tools() -> Result<()> {
    for tool in REQUIRED_TOOLS {
        require_tool(tool)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_tool_missing() {
        let check = optional_tool("ffbuild-no-such-tool-xyz");
        assert!(!check.found());
        assert_eq!(check.name, "ffbuild-no-such-tool-xyz");
    }

    #[test]
    fn test_require_tool_missing_is_error() {
        let err = require_tool("ffbuild-no-such-tool-xyz").unwrap_err();
        assert!(err.to_string().contains("not found on PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn test_optional_tool_present() {
        // sh is guaranteed on any unix host this tool can run on
        let check = optional_tool("sh");
        assert!(check.found());
    }
}
