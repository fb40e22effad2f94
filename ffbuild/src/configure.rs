//! Configure invocation assembly.
//!
//! Takes everything the resolvers produced (architecture, output dir,
//! feature set, cross-compile probe results) and lays it out as the final
//! argument vector. The downstream configure script does not care about
//! flag order, but the sequence is kept deterministic so two runs with the
//! same probe results log the same invocation.

use crate::arch::Arch;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::features::{build_feature_flags, FeatureFlagSet};
use crate::paths::BuildPaths;
use crate::probe::PackageProbe;
use crate::toolchain::ToolchainEnv;
use chrono::NaiveDate;
use serde::Serialize;
use shared_utils::command::run_quiet_status;
use shared_utils::tools;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Cross-compilation probe results for x86_64 targets on an arm64 host.
/// Both checks are independent; either or both may demand a flag.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CrossChecks {
    /// Whether the binary-translation layer can actually execute x86_64
    /// code. When it cannot, configure must be told it is cross-compiling.
    pub rosetta_usable: bool,
    /// Whether an x86 assembler (nasm or yasm) exists on the search path.
    /// Without one, x86 assembly optimizations have to be disabled.
    pub have_x86_assembler: bool,
}

impl CrossChecks {
    /// A native build needs neither compensation.
    pub fn native() -> Self {
        Self {
            rosetta_usable: true,
            have_x86_assembler: true,
        }
    }
}

/// Probe the host for the two x86-on-arm64 compensations. Native targets
/// short-circuit to no-ops.
pub fn detect_cross_checks(arch: Arch) -> CrossChecks {
    if arch != Arch::X86_64 || Arch::host() != Some(Arch::Arm64) {
        return CrossChecks::native();
    }

    // Rosetta is usable iff a trivial command runs under the alternate
    // architecture.
    let rosetta_usable = run_quiet_status(Command::new("arch").args(["-x86_64", "/usr/bin/true"]));

    let have_x86_assembler =
        tools::optional_tool("nasm").found() || tools::optional_tool("yasm").found();

    if !rosetta_usable {
        info!("Rosetta not usable, configuring as cross-compile");
    }
    if !have_x86_assembler {
        info!("Neither nasm nor yasm found, disabling x86 assembly");
    }

    CrossChecks {
        rosetta_usable,
        have_x86_assembler,
    }
}

/// Assemble the full configure argument vector: fixed base flags, then
/// architecture/target flags, then cross-compile compensations, then the
/// probed feature flags in table order.
pub fn assemble_configure_args(
    arch: Arch,
    output_dir: &Path,
    features: &FeatureFlagSet,
    cross: &CrossChecks,
    stamp: NaiveDate,
) -> Vec<String> {
    let mut args = vec![
        format!("--prefix={}", output_dir.display()),
        "--pkg-config-flags=--static".to_string(),
        "--enable-gpl".to_string(),
        "--enable-version3".to_string(),
    ];

    if features.has_nonfree() {
        args.push("--enable-nonfree".to_string());
    }

    args.push("--disable-debug".to_string());
    args.push("--disable-doc".to_string());
    args.push("--enable-videotoolbox".to_string());
    args.push(format!("--extra-version=ffbuild-{}", stamp.format("%Y%m%d")));

    args.push(format!("--arch={}", arch.canonical_name()));
    args.push("--target-os=darwin".to_string());

    if !cross.rosetta_usable {
        args.push("--enable-cross-compile".to_string());
    }
    if !cross.have_x86_assembler {
        args.push("--disable-x86asm".to_string());
    }

    args.extend(features.enabled_flags().map(String::from));

    args
}

/// Everything a build run needs, resolved up front. Also what the `plan`
/// command prints.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub arch: Arch,
    pub tag: String,
    pub branch: String,
    pub jobs: usize,
    pub universal: bool,
    pub deployment_target: String,
    pub paths: BuildPaths,
    pub features: FeatureFlagSet,
    pub cross: CrossChecks,
    pub configure_args: Vec<String>,
}

/// Run the whole configuration resolver: architecture, paths, features,
/// configure args. Pure given its inputs; all host interaction happens
/// through the probe and the pre-computed cross checks.
pub fn resolve_plan(
    config: &BuildConfig,
    arch: Arch,
    toolchain: &ToolchainEnv,
    probe: &dyn PackageProbe,
    cross: CrossChecks,
    today: NaiveDate,
) -> Result<BuildPlan, BuildError> {
    let tag = arch.output_tag().to_string();
    let paths = BuildPaths::resolve(&config.root_dir, config.out_override.as_deref(), &tag)?;

    let features = build_feature_flags(probe, config.nonfree);
    let configure_args =
        assemble_configure_args(arch, &paths.output_dir, &features, &cross, today);

    Ok(BuildPlan {
        arch,
        tag,
        branch: config.branch.clone(),
        jobs: config.jobs,
        universal: config.universal,
        deployment_target: toolchain.deployment_target.clone(),
        paths,
        features,
        cross,
        configure_args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildConfig, CliOverrides, EnvSnapshot};
    use crate::probe::StaticProbe;
    use crate::toolchain::resolve_toolchain_with_prefix;
    use std::path::PathBuf;

    fn stamp() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
    }

    fn default_config() -> BuildConfig {
        BuildConfig::from_parts(EnvSnapshot::default(), CliOverrides::default())
    }

    #[test]
    fn test_base_flags_and_order() {
        let features = build_feature_flags(&StaticProbe::empty(), false);
        let args = assemble_configure_args(
            Arch::Arm64,
            Path::new("/work/out-arm64"),
            &features,
            &CrossChecks::native(),
            stamp(),
        );

        assert_eq!(args[0], "--prefix=/work/out-arm64");
        assert!(args.contains(&"--pkg-config-flags=--static".to_string()));
        assert!(args.contains(&"--enable-gpl".to_string()));
        assert!(args.contains(&"--enable-version3".to_string()));
        assert!(args.contains(&"--disable-debug".to_string()));
        assert!(args.contains(&"--disable-doc".to_string()));
        assert!(args.contains(&"--enable-videotoolbox".to_string()));
        assert!(args.contains(&"--extra-version=ffbuild-20260805".to_string()));
        assert!(args.contains(&"--arch=arm64".to_string()));
        assert!(args.contains(&"--target-os=darwin".to_string()));

        // No cross-compile compensation and no feature flags.
        assert!(!args.iter().any(|a| a == "--enable-cross-compile"));
        assert!(!args.iter().any(|a| a == "--disable-x86asm"));
        assert!(!args.iter().any(|a| a.starts_with("--enable-lib")));
    }

    #[test]
    fn test_cross_checks_fire_independently() {
        let features = build_feature_flags(&StaticProbe::empty(), false);
        let out = Path::new("/o");

        let no_rosetta = CrossChecks {
            rosetta_usable: false,
            have_x86_assembler: true,
        };
        let args = assemble_configure_args(Arch::X86_64, out, &features, &no_rosetta, stamp());
        assert!(args.contains(&"--enable-cross-compile".to_string()));
        assert!(!args.contains(&"--disable-x86asm".to_string()));

        let no_asm = CrossChecks {
            rosetta_usable: true,
            have_x86_assembler: false,
        };
        let args = assemble_configure_args(Arch::X86_64, out, &features, &no_asm, stamp());
        assert!(!args.contains(&"--enable-cross-compile".to_string()));
        assert!(args.contains(&"--disable-x86asm".to_string()));

        let both = CrossChecks {
            rosetta_usable: false,
            have_x86_assembler: false,
        };
        let args = assemble_configure_args(Arch::X86_64, out, &features, &both, stamp());
        assert!(args.contains(&"--enable-cross-compile".to_string()));
        assert!(args.contains(&"--disable-x86asm".to_string()));
    }

    #[test]
    fn test_feature_flags_follow_fixed_flags_in_probe_order() {
        let probe = StaticProbe::with_libraries(&["opus", "x264"]);
        let features = build_feature_flags(&probe, false);
        let args = assemble_configure_args(
            Arch::Arm64,
            Path::new("/o"),
            &features,
            &CrossChecks::native(),
            stamp(),
        );

        let x264_pos = args.iter().position(|a| a == "--enable-libx264").unwrap();
        let opus_pos = args.iter().position(|a| a == "--enable-libopus").unwrap();
        let target_pos = args.iter().position(|a| a == "--target-os=darwin").unwrap();
        assert!(target_pos < x264_pos);
        assert!(x264_pos < opus_pos);
    }

    #[test]
    fn test_nonfree_adds_license_flag_before_features() {
        let probe = StaticProbe::with_libraries(&["fdk-aac"]);
        let features = build_feature_flags(&probe, true);
        let args = assemble_configure_args(
            Arch::Arm64,
            Path::new("/o"),
            &features,
            &CrossChecks::native(),
            stamp(),
        );

        let nonfree_pos = args.iter().position(|a| a == "--enable-nonfree").unwrap();
        let fdk_pos = args
            .iter()
            .position(|a| a == "--enable-libfdk-aac")
            .unwrap();
        let version3_pos = args.iter().position(|a| a == "--enable-version3").unwrap();
        assert!(version3_pos < nonfree_pos);
        assert!(nonfree_pos < fdk_pos);
    }

    #[test]
    fn test_resolve_plan_aarch64_scenario() {
        let env = EnvSnapshot {
            arch: Some("aarch64".to_string()),
            ..Default::default()
        };
        let config = BuildConfig::from_parts(env, CliOverrides::default());
        let arch = crate::arch::resolve_architecture(&config.arch_token).unwrap();
        let tc = resolve_toolchain_with_prefix(arch, None, &config);

        let plan = resolve_plan(
            &config,
            arch,
            &tc,
            &StaticProbe::empty(),
            CrossChecks::native(),
            stamp(),
        )
        .unwrap();

        assert_eq!(plan.arch, Arch::Arm64);
        assert_eq!(plan.tag, "arm64");
        assert!(plan.paths.output_dir.ends_with("work/out-arm64"));
    }

    #[test]
    fn test_resolve_plan_honors_out_override() {
        let cli = CliOverrides {
            arch: Some("x64".to_string()),
            out: Some("/exact/out".into()),
            ..Default::default()
        };
        let config = BuildConfig::from_parts(EnvSnapshot::default(), cli);
        let arch = crate::arch::resolve_architecture(&config.arch_token).unwrap();
        let tc = resolve_toolchain_with_prefix(arch, None, &config);

        let plan = resolve_plan(
            &config,
            arch,
            &tc,
            &StaticProbe::empty(),
            CrossChecks::native(),
            stamp(),
        )
        .unwrap();

        assert_eq!(plan.tag, "x64");
        assert_eq!(plan.paths.output_dir, PathBuf::from("/exact/out"));
        assert_eq!(plan.configure_args[0], "--prefix=/exact/out");
    }

    #[test]
    fn test_degraded_x86_plan_has_arch_flags_only() {
        // Missing Intel prefix: no optional libraries, but the build still
        // carries its architecture-forcing configuration.
        let config = default_config();
        let tc = resolve_toolchain_with_prefix(Arch::X86_64, None, &config);
        let plan = resolve_plan(
            &config,
            Arch::X86_64,
            &tc,
            &StaticProbe::empty(),
            CrossChecks::native(),
            stamp(),
        )
        .unwrap();

        assert!(plan.configure_args.contains(&"--arch=x86_64".to_string()));
        assert_eq!(plan.features.enabled_count(), 0);
        assert!(tc.cflags.contains("-arch x86_64"));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::probe::StaticProbe;
    use proptest::prelude::*;

    proptest! {
        /// Identical inputs produce a byte-identical argument vector.
        #[test]
        fn prop_assembly_deterministic(
            mask in proptest::collection::vec(any::<bool>(), 17),
            rosetta in any::<bool>(),
            asm in any::<bool>(),
            nonfree in any::<bool>()
        ) {
            let libs: Vec<&str> = crate::features::OPTIONAL_LIBRARIES
                .iter()
                .zip(mask.iter())
                .filter(|(_, &m)| m)
                .map(|((id, _), _)| *id)
                .collect();
            let probe = StaticProbe::with_libraries(&libs);
            let features = crate::features::build_feature_flags(&probe, nonfree);
            let cross = CrossChecks { rosetta_usable: rosetta, have_x86_assembler: asm };
            let stamp = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();

            let first = assemble_configure_args(
                Arch::X86_64, Path::new("/o"), &features, &cross, stamp);
            let second = assemble_configure_args(
                Arch::X86_64, Path::new("/o"), &features, &cross, stamp);

            prop_assert_eq!(first, second);
        }
    }
}
