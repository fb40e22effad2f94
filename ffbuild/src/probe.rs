//! Optional-library probing.
//!
//! Library presence is answered by the host's package metadata, never
//! guessed. Absence is the expected common case: a failed query, a missing
//! pkg-config binary and a genuinely uninstalled library all read as
//! "absent" and none of them is an error.

use shared_utils::command::run_quiet_status;
use std::collections::BTreeSet;
use std::process::Command;

/// Capability seam for library availability, so flag assembly can be
/// exercised without any libraries installed.
pub trait PackageProbe {
    fn available(&self, library: &str) -> bool;
}

/// Real probe backed by `pkg-config --exists`.
pub struct PkgConfigProbe {
    pkg_config_path: String,
}

impl PkgConfigProbe {
    pub fn new(pkg_config_path: impl Into<String>) -> Self {
        Self {
            pkg_config_path: pkg_config_path.into(),
        }
    }
}

impl PackageProbe for PkgConfigProbe {
    fn available(&self, library: &str) -> bool {
        let mut cmd = Command::new("pkg-config");
        cmd.args(["--exists", library]);
        if !self.pkg_config_path.is_empty() {
            cmd.env("PKG_CONFIG_PATH", &self.pkg_config_path);
        }
        run_quiet_status(&mut cmd)
    }
}

/// Fixed-answer probe for tests and dry resolution.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    present: BTreeSet<String>,
}

impl StaticProbe {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_libraries(libraries: &[&str]) -> Self {
        Self {
            present: libraries.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PackageProbe for StaticProbe {
    fn available(&self, library: &str) -> bool {
        self.present.contains(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_probe() {
        let probe = StaticProbe::with_libraries(&["opus", "x264"]);
        assert!(probe.available("opus"));
        assert!(probe.available("x264"));
        assert!(!probe.available("x265"));
    }

    #[test]
    fn test_empty_probe_finds_nothing() {
        let probe = StaticProbe::empty();
        assert!(!probe.available("opus"));
    }

    #[test]
    fn test_pkg_config_absence_is_false_not_error() {
        // Even if pkg-config itself is missing on the host, the probe must
        // answer false rather than fail.
        let probe = PkgConfigProbe::new("");
        let _ = probe.available("ffbuild-no-such-library");
    }
}
