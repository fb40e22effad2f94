//! Target architecture resolution.

use crate::error::BuildError;
use serde::Serialize;
use std::fmt;

/// The two architectures a native macOS FFmpeg build can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    Arm64,
    X86_64,
}

impl Arch {
    /// Canonical name as FFmpeg's configure understands it.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "x86_64",
        }
    }

    /// Short tag used in output directory and artifact names.
    pub fn output_tag(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "x64",
        }
    }

    /// Architecture of the machine this process runs on.
    pub fn host() -> Option<Arch> {
        match std::env::consts::ARCH {
            "aarch64" => Some(Arch::Arm64),
            "x86_64" => Some(Arch::X86_64),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// Map a free-form architecture token onto a canonical architecture.
///
/// Tokens are case-sensitive. Anything outside the known alias set is a
/// fatal configuration error; no build is attempted.
pub fn resolve_architecture(token: &str) -> Result<Arch, BuildError> {
    match token {
        "arm64" | "aarch64" => Ok(Arch::Arm64),
        "x86_64" | "x64" | "amd64" => Ok(Arch::X86_64),
        other => Err(BuildError::UnsupportedArchitecture {
            token: other.to_string(),
        }),
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any token outside the fixed alias set hits the fatal path, and
        /// every accepted token lands on exactly one of two outcomes.
        #[test]
        fn prop_only_known_aliases_resolve(token in "[a-zA-Z0-9_]{0,12}") {
            let known = ["arm64", "aarch64", "x86_64", "x64", "amd64"];
            match resolve_architecture(&token) {
                Ok(arch) => {
                    prop_assert!(known.contains(&token.as_str()));
                    prop_assert!(matches!(arch, Arch::Arm64 | Arch::X86_64));
                }
                Err(e) => {
                    prop_assert!(!known.contains(&token.as_str()));
                    prop_assert_eq!(e.exit_code(), 2);
                }
            }
        }

        /// Resolution is deterministic: repeated calls agree.
        #[test]
        fn prop_resolution_deterministic(token in ".{0,16}") {
            let first = resolve_architecture(&token).ok();
            let second = resolve_architecture(&token).ok();
            prop_assert_eq!(first, second);
        }
    }
}
