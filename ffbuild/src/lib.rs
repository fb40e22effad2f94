//! ffbuild - native macOS FFmpeg build orchestrator
//!
//! Turns one command into a ready-to-ship FFmpeg install tree:
//! - Architecture resolution (Apple Silicon / Intel, with aliases)
//! - Optional codec library discovery via pkg-config
//! - Toolchain environment resolution (Homebrew prefixes, deployment target)
//! - Configure flag assembly, deterministic given identical probe results
//! - Source fetch, configure/make/install invocation
//! - Universal-binary merge and zip packaging

pub mod arch;
pub mod builder;
pub mod config;
pub mod configure;
pub mod error;
pub mod features;
pub mod package;
pub mod paths;
pub mod probe;
pub mod source;
pub mod toolchain;

pub use arch::{resolve_architecture, Arch};
pub use builder::{execute_plan, BuildSystem, MakeBuilder};
pub use config::{BuildConfig, CliOverrides, EnvSnapshot};
pub use configure::{
    assemble_configure_args, detect_cross_checks, resolve_plan, BuildPlan, CrossChecks,
};
pub use error::BuildError;
pub use features::{build_feature_flags, FeatureFlag, FeatureFlagSet, OPTIONAL_LIBRARIES};
pub use package::{merge_universal, zip_output};
pub use paths::{resolve_output_dir, BuildPaths};
pub use probe::{PackageProbe, PkgConfigProbe, StaticProbe};
pub use source::{GitSource, SourceRepository};
pub use toolchain::{resolve_deployment_target, resolve_toolchain, ToolchainEnv};
