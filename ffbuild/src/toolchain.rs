//! Toolchain environment resolution.
//!
//! Homebrew installs per-architecture prefixes (`/opt/homebrew` on Apple
//! Silicon, `/usr/local` historically on Intel). The resolver locates the
//! prefix matching the target architecture, prepends its tool and
//! pkg-config directories so they win lookup, and appends the
//! architecture-forcing compiler flags after whatever the caller already
//! exported. A missing Intel prefix on an arm64 host degrades the build
//! (no optional libraries) instead of failing it.

use crate::arch::Arch;
use crate::config::BuildConfig;
use shared_utils::command::run_checked;
use shared_utils::ui;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Minimum macOS version the produced binaries declare.
pub const DEFAULT_DEPLOYMENT_TARGET: &str = "12.0";

/// Candidate prefixes for an Intel Homebrew living next to an Apple
/// Silicon one, probed in order.
pub const X86_BREW_CANDIDATES: [&str; 3] =
    ["/usr/local", "/usr/local/homebrew", "/opt/homebrew-intel"];

/// Keg-only formulae whose pkgconfig dirs never land in the shared
/// `lib/pkgconfig` and must be added individually.
pub const KEG_ONLY_PKGCONFIG_LIBS: [&str; 3] = ["zlib", "libxml2", "openssl@3"];

/// Resolved toolchain environment for one configure/make run.
#[derive(Debug, Clone)]
pub struct ToolchainEnv {
    pub cc: String,
    pub cxx: String,
    /// Directories prepended to PATH, highest priority first.
    pub path_entries: Vec<PathBuf>,
    /// Directories prepended to PKG_CONFIG_PATH, highest priority first.
    pub pkg_config_paths: Vec<PathBuf>,
    /// Final CFLAGS: caller's value first, resolver additions appended.
    pub cflags: String,
    /// Final LDFLAGS, same convention.
    pub ldflags: String,
    pub deployment_target: String,
    /// Package prefix actually used, when one was found.
    pub brew_prefix: Option<PathBuf>,
    base_path: String,
    base_pkg_config_path: String,
}

impl ToolchainEnv {
    /// Full PATH value: resolver entries first, caller's PATH after.
    pub fn path_value(&self) -> String {
        join_paths(&self.path_entries, &self.base_path)
    }

    /// Full PKG_CONFIG_PATH value, same precedence.
    pub fn pkg_config_value(&self) -> String {
        join_paths(&self.pkg_config_paths, &self.base_pkg_config_path)
    }
}

fn join_paths(entries: &[PathBuf], base: &str) -> String {
    let mut parts: Vec<String> = entries
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();
    if !base.is_empty() {
        parts.push(base.to_string());
    }
    parts.join(":")
}

/// Deployment target precedence: explicit override, then the caller's
/// pre-existing environment value, then the fixed default.
pub fn resolve_deployment_target(explicit: Option<&str>, env_value: Option<&str>) -> String {
    explicit
        .or(env_value)
        .unwrap_or(DEFAULT_DEPLOYMENT_TARGET)
        .to_string()
}

/// A directory is a usable Homebrew prefix iff its `Cellar` marker exists.
fn has_cellar(prefix: &Path) -> bool {
    prefix.join("Cellar").is_dir()
}

/// First candidate directory containing a `Cellar` marker.
fn first_prefix_with_cellar<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .find(|p| has_cellar(p))
        .map(Path::to_path_buf)
}

/// Native (arm64) Homebrew prefix: ask brew itself, fall back to the
/// standard location.
fn discover_native_brew_prefix() -> Option<PathBuf> {
    if let Ok(output) = run_checked(Command::new("brew").arg("--prefix"), "brew --prefix") {
        let prefix = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !prefix.is_empty() {
            return Some(PathBuf::from(prefix));
        }
    }
    let fallback = Path::new("/opt/homebrew");
    has_cellar(fallback).then(|| fallback.to_path_buf())
}

/// Intel Homebrew prefix for x86_64 targets: explicit override verbatim,
/// else the fixed candidate list, first `Cellar` match wins.
pub fn resolve_x86_brew_prefix(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    first_prefix_with_cellar(X86_BREW_CANDIDATES.iter().map(Path::new))
}

/// Append an addition after whatever flags already exist.
fn append_flags(existing: &str, addition: &str) -> String {
    if existing.trim().is_empty() {
        addition.to_string()
    } else {
        format!("{} {}", existing.trim_end(), addition)
    }
}

fn apply_brew_prefix(tc: &mut ToolchainEnv, prefix: &Path) {
    tc.path_entries.push(prefix.join("opt/llvm/bin"));

    tc.pkg_config_paths.push(prefix.join("lib/pkgconfig"));
    for lib in KEG_ONLY_PKGCONFIG_LIBS {
        tc.pkg_config_paths
            .push(prefix.join("opt").join(lib).join("lib/pkgconfig"));
    }

    tc.cflags = append_flags(&tc.cflags, &format!("-I{}/include", prefix.display()));
    tc.ldflags = append_flags(&tc.ldflags, &format!("-L{}/lib", prefix.display()));
    tc.brew_prefix = Some(prefix.to_path_buf());
}

/// Pure core of toolchain resolution, with the package prefix already
/// decided. Exercised directly by tests with synthetic prefixes.
pub fn resolve_toolchain_with_prefix(
    arch: Arch,
    prefix: Option<&Path>,
    config: &BuildConfig,
) -> ToolchainEnv {
    let deployment_target = resolve_deployment_target(
        config.deployment_target_override.as_deref(),
        config.env_deployment_target.as_deref(),
    );

    let mut tc = ToolchainEnv {
        cc: config.cc.clone(),
        cxx: config.cxx.clone(),
        path_entries: Vec::new(),
        pkg_config_paths: Vec::new(),
        cflags: config.cflags.clone(),
        ldflags: config.ldflags.clone(),
        deployment_target,
        brew_prefix: None,
        base_path: config.base_path.clone(),
        base_pkg_config_path: config.base_pkg_config_path.clone(),
    };

    if let Some(prefix) = prefix {
        apply_brew_prefix(&mut tc, prefix);
    }

    // Architecture forcing always appends, never replaces, so the caller's
    // own flags survive in front.
    let arch_flags = format!(
        "-arch {} -mmacosx-version-min={}",
        arch.canonical_name(),
        tc.deployment_target
    );
    tc.cflags = append_flags(&tc.cflags, &arch_flags);
    tc.ldflags = append_flags(&tc.ldflags, &arch_flags);

    tc
}

/// Resolve the toolchain for the target architecture, locating the package
/// prefix on the live host.
pub fn resolve_toolchain(arch: Arch, config: &BuildConfig) -> ToolchainEnv {
    let prefix = match arch {
        Arch::Arm64 => {
            let p = discover_native_brew_prefix();
            if p.is_none() {
                info!("No Homebrew prefix found, building without optional libraries");
            }
            p
        }
        Arch::X86_64 => {
            let p = resolve_x86_brew_prefix(config.brew_x86_prefix.as_deref());
            if p.is_none() {
                warn!(
                    candidates = ?X86_BREW_CANDIDATES,
                    "No Intel Homebrew prefix found, continuing degraded"
                );
                ui::print_warning(&format!(
                    "No Intel Homebrew prefix found (probed {}); \
                     building without optional libraries. Set BREW_X86_PREFIX to override.",
                    X86_BREW_CANDIDATES.join(", ")
                ));
            }
            p
        }
    };

    if let Some(ref p) = prefix {
        info!(prefix = %p.display(), arch = %arch, "Using package prefix");
    }

    resolve_toolchain_with_prefix(arch, prefix.as_deref(), config)
}
