//! Run configuration.
//!
//! The environment is read exactly once, at startup, into an immutable
//! snapshot; every resolver function receives configuration explicitly
//! instead of consulting the process environment ad hoc. CLI flags override
//! environment values, which override defaults.

use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Raw environment capture. Taken once per invocation; nothing else in the
/// pipeline reads `std::env` for build inputs.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub arch: Option<String>,
    pub out: Option<String>,
    pub branch: Option<String>,
    pub jobs: Option<String>,
    pub deployment_target: Option<String>,
    pub macosx_deployment_target: Option<String>,
    pub brew_x86_prefix: Option<String>,
    pub nonfree: Option<String>,
    pub universal: Option<String>,
    pub cc: Option<String>,
    pub cxx: Option<String>,
    pub cflags: Option<String>,
    pub ldflags: Option<String>,
    pub path: Option<String>,
    pub pkg_config_path: Option<String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self {
            arch: env::var("ARCH").ok(),
            out: env::var("OUT").ok(),
            branch: env::var("BRANCH").ok(),
            jobs: env::var("JOBS").ok(),
            deployment_target: env::var("DEPLOYMENT_TARGET").ok(),
            macosx_deployment_target: env::var("MACOSX_DEPLOYMENT_TARGET").ok(),
            brew_x86_prefix: env::var("BREW_X86_PREFIX").ok(),
            nonfree: env::var("NONFREE").ok(),
            universal: env::var("UNIVERSAL").ok(),
            cc: env::var("CC").ok(),
            cxx: env::var("CXX").ok(),
            cflags: env::var("CFLAGS").ok(),
            ldflags: env::var("LDFLAGS").ok(),
            path: env::var("PATH").ok(),
            pkg_config_path: env::var("PKG_CONFIG_PATH").ok(),
        }
    }
}

/// Command-line overrides. Highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub arch: Option<String>,
    pub out: Option<PathBuf>,
    pub branch: Option<String>,
    pub jobs: Option<usize>,
    pub deployment_target: Option<String>,
    pub brew_x86_prefix: Option<PathBuf>,
    pub nonfree: bool,
    pub universal: bool,
    pub root: Option<PathBuf>,
}

/// Fully-resolved, immutable configuration for one invocation.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Requested architecture token, not yet validated.
    pub arch_token: String,
    pub out_override: Option<PathBuf>,
    pub branch: String,
    pub jobs: usize,
    pub deployment_target_override: Option<String>,
    /// Caller's pre-existing MACOSX_DEPLOYMENT_TARGET, if any.
    pub env_deployment_target: Option<String>,
    pub brew_x86_prefix: Option<PathBuf>,
    pub nonfree: bool,
    pub universal: bool,
    pub cc: String,
    pub cxx: String,
    /// Caller-supplied flags; architecture forcing appends to these.
    pub cflags: String,
    pub ldflags: String,
    pub base_path: String,
    pub base_pkg_config_path: String,
    pub root_dir: PathBuf,
}

impl BuildConfig {
    /// Merge the environment snapshot and CLI overrides into a config.
    pub fn from_parts(env: EnvSnapshot, cli: CliOverrides) -> Self {
        let arch_token = cli
            .arch
            .or(env.arch)
            .unwrap_or_else(|| env::consts::ARCH.to_string());

        let jobs = match cli.jobs {
            Some(n) => n,
            None => match env.jobs.as_deref() {
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!(jobs = raw, "Invalid JOBS value, using host CPU count");
                    num_cpus::get()
                }),
                None => num_cpus::get(),
            },
        };

        Self {
            arch_token,
            out_override: cli.out.or(env.out.map(PathBuf::from)),
            branch: cli
                .branch
                .or(env.branch)
                .unwrap_or_else(|| "master".to_string()),
            jobs,
            deployment_target_override: cli.deployment_target.or(env.deployment_target),
            env_deployment_target: env.macosx_deployment_target,
            brew_x86_prefix: cli
                .brew_x86_prefix
                .or(env.brew_x86_prefix.map(PathBuf::from)),
            nonfree: cli.nonfree || env_flag(env.nonfree.as_deref()),
            universal: cli.universal || env_flag(env.universal.as_deref()),
            cc: env.cc.unwrap_or_else(|| "clang".to_string()),
            cxx: env.cxx.unwrap_or_else(|| "clang++".to_string()),
            cflags: env.cflags.unwrap_or_default(),
            ldflags: env.ldflags.unwrap_or_default(),
            base_path: env.path.unwrap_or_default(),
            base_pkg_config_path: env.pkg_config_path.unwrap_or_default(),
            root_dir: cli.root.unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn resolve(cli: CliOverrides) -> Self {
        Self::from_parts(EnvSnapshot::capture(), cli)
    }
}

/// Boolean environment convention: set and truthy means enabled.
fn env_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("yes") | Some("on"))
}
