use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use ffbuild::{
    detect_cross_checks, merge_universal, package, resolve_architecture, resolve_plan,
    resolve_toolchain, zip_output, BuildConfig, BuildError, BuildPlan, CliOverrides, GitSource,
    MakeBuilder, PkgConfigProbe, ToolchainEnv,
};

#[derive(Parser)]
#[command(name = "ffbuild")]
#[command(version, about = "Native macOS FFmpeg build orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, configure, compile, install and package FFmpeg
    Build {
        /// Target architecture (arm64, aarch64, x86_64, x64, amd64)
        #[arg(long)]
        arch: Option<String>,

        /// Install directory (default: <root>/work/out-<tag>)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Upstream branch or tag to build
        #[arg(short, long)]
        branch: Option<String>,

        /// Parallel compile jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Minimum macOS version for the produced binaries
        #[arg(long)]
        deployment_target: Option<String>,

        /// Intel Homebrew prefix for x86_64 builds
        #[arg(long)]
        brew_x86_prefix: Option<PathBuf>,

        /// Enable the nonfree encoder when its library is installed
        #[arg(long)]
        nonfree: bool,

        /// Merge both per-arch builds into universal binaries afterwards
        #[arg(long)]
        universal: bool,

        /// Root directory for work/ and artifacts/
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Resolve the full build configuration and print it, building nothing
    Plan {
        #[arg(long)]
        arch: Option<String>,

        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(short, long)]
        branch: Option<String>,

        #[arg(short, long)]
        jobs: Option<usize>,

        #[arg(long)]
        deployment_target: Option<String>,

        #[arg(long)]
        brew_x86_prefix: Option<PathBuf>,

        #[arg(long)]
        nonfree: bool,

        #[arg(long)]
        universal: bool,

        #[arg(long)]
        root: Option<PathBuf>,

        #[arg(short = 'O', long, default_value = "human")]
        output: OutputFormat,
    },

    /// Report which optional libraries the host can provide
    Probe {
        #[arg(long)]
        arch: Option<String>,

        #[arg(long)]
        brew_x86_prefix: Option<PathBuf>,

        /// Include the nonfree encoder in the report
        #[arg(long)]
        nonfree: bool,

        #[arg(short = 'O', long, default_value = "human")]
        output: OutputFormat,
    },

    /// Merge existing per-arch outputs into universal binaries and zip them
    Merge {
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

fn main() {
    let _ = shared_utils::logging::init_logging(
        "ffbuild",
        shared_utils::logging::LogConfig::default(),
    );

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        shared_utils::print_error(&format!("{:#}", e));
        let code = e
            .downcast_ref::<BuildError>()
            .map(|b| b.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Build {
            arch,
            out,
            branch,
            jobs,
            deployment_target,
            brew_x86_prefix,
            nonfree,
            universal,
            root,
        } => {
            let config = BuildConfig::resolve(CliOverrides {
                arch,
                out,
                branch,
                jobs,
                deployment_target,
                brew_x86_prefix,
                nonfree,
                universal,
                root,
            });
            run_build(&config)
        }

        Commands::Plan {
            arch,
            out,
            branch,
            jobs,
            deployment_target,
            brew_x86_prefix,
            nonfree,
            universal,
            root,
            output,
        } => {
            let config = BuildConfig::resolve(CliOverrides {
                arch,
                out,
                branch,
                jobs,
                deployment_target,
                brew_x86_prefix,
                nonfree,
                universal,
                root,
            });
            let (plan, tc) = resolve(&config)?;
            match output {
                OutputFormat::Human => print_plan_human(&plan, &tc),
                OutputFormat::Json => {
                    let report = serde_json::json!({
                        "plan": plan,
                        "toolchain": {
                            "cc": tc.cc,
                            "cxx": tc.cxx,
                            "cflags": tc.cflags,
                            "ldflags": tc.ldflags,
                            "path": tc.path_value(),
                            "pkg_config_path": tc.pkg_config_value(),
                            "brew_prefix": tc.brew_prefix,
                            "deployment_target": tc.deployment_target,
                        },
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
            Ok(())
        }

        Commands::Probe {
            arch,
            brew_x86_prefix,
            nonfree,
            output,
        } => {
            let config = BuildConfig::resolve(CliOverrides {
                arch,
                brew_x86_prefix,
                nonfree,
                ..Default::default()
            });
            let arch = resolve_architecture(&config.arch_token)?;
            let tc = resolve_toolchain(arch, &config);
            let probe = PkgConfigProbe::new(tc.pkg_config_value());
            let set = ffbuild::build_feature_flags(&probe, config.nonfree);

            match output {
                OutputFormat::Human => {
                    println!("\n📦 Optional Library Probe ({})", arch);
                    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
                    for entry in set.entries() {
                        let mark = if entry.enabled { "✅" } else { "❌" };
                        println!("{} {:<12} {}", mark, entry.library, entry.flag);
                    }
                    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
                    println!(
                        "{} of {} optional libraries available",
                        set.enabled_count(),
                        set.entries().len()
                    );
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(set.entries())?);
                }
            }
            Ok(())
        }

        Commands::Merge { root } => {
            let config = BuildConfig::resolve(CliOverrides {
                root,
                ..Default::default()
            });
            let arch = resolve_architecture(&config.arch_token)?;
            let paths = ffbuild::BuildPaths::resolve(
                &config.root_dir,
                None,
                arch.output_tag(),
            )?;

            let universal_dir = merge_universal(&paths)?;
            let archive = zip_output(&universal_dir, package::UNIVERSAL_TAG, &paths.artifacts_dir)?;
            shared_utils::print_success(&format!("Artifact: {}", archive.display()));
            Ok(())
        }
    }
}

/// Resolve everything a build or plan needs from one immutable config.
fn resolve(config: &BuildConfig) -> anyhow::Result<(BuildPlan, ToolchainEnv)> {
    let arch = resolve_architecture(&config.arch_token)?;
    let tc = resolve_toolchain(arch, config);
    let probe = PkgConfigProbe::new(tc.pkg_config_value());
    let cross = detect_cross_checks(arch);
    let today = chrono::Local::now().date_naive();
    let plan = resolve_plan(config, arch, &tc, &probe, cross, today)?;
    Ok((plan, tc))
}

fn run_build(config: &BuildConfig) -> anyhow::Result<()> {
    // Resolve before touching the filesystem so a bad architecture token
    // aborts with nothing created and nothing external spawned.
    let (plan, tc) = resolve(config)?;

    shared_utils::tools::check_required_tools()?;

    info!("🔨 FFmpeg macOS Build");
    info!("   Arch: {} (tag: {})", plan.arch, plan.tag);
    info!("   Branch: {}", plan.branch);
    info!("   Jobs: {}", plan.jobs);
    info!("   Deployment target: {}", plan.deployment_target);
    info!("   Output: {}", plan.paths.output_dir.display());
    info!(
        "   Optional libraries: {} of {}",
        plan.features.enabled_count(),
        plan.features.entries().len()
    );
    if plan.features.has_nonfree() {
        info!("   🔓 Nonfree encoder: ENABLED");
    }
    if plan.universal {
        info!("   📦 Universal merge: ENABLED");
    }
    info!("");

    plan.paths.create_dirs()?;

    let source = GitSource::new(plan.paths.ffmpeg_dir.clone());
    let builder = MakeBuilder::new(&plan.paths.ffmpeg_dir, &tc);
    ffbuild::execute_plan(&plan, &source, &builder)?;

    shared_utils::ui::print_stage(shared_utils::ui::symbols::PACKAGE, "Packaging");
    let archive = zip_output(&plan.paths.output_dir, &plan.tag, &plan.paths.artifacts_dir)?;
    shared_utils::print_success(&format!("Artifact: {}", archive.display()));

    if plan.universal {
        let universal_dir = merge_universal(&plan.paths)?;
        let archive = zip_output(
            &universal_dir,
            package::UNIVERSAL_TAG,
            &plan.paths.artifacts_dir,
        )?;
        shared_utils::print_success(&format!("Universal artifact: {}", archive.display()));
    }

    Ok(())
}

fn print_plan_human(plan: &BuildPlan, tc: &ToolchainEnv) {
    println!("\n🎯 Build Plan");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🏗  Arch: {} (tag: {})", plan.arch, plan.tag);
    println!("🌿 Branch: {} • Jobs: {}", plan.branch, plan.jobs);
    println!("🎚  Deployment target: {}", plan.deployment_target);
    println!("📁 Output: {}", plan.paths.output_dir.display());
    match &tc.brew_prefix {
        Some(prefix) => println!("🍺 Package prefix: {}", prefix.display()),
        None => println!("🍺 Package prefix: none (no optional libraries)"),
    }
    if !plan.cross.rosetta_usable {
        println!("⚠️  Rosetta unusable → cross-compile");
    }
    if !plan.cross.have_x86_assembler {
        println!("⚠️  No x86 assembler → x86asm disabled");
    }
    println!();
    println!("⚙️  ./configure \\");
    for arg in &plan.configure_args {
        println!("      {} \\", arg);
    }
    println!();
    println!("   CC={}  CXX={}", tc.cc, tc.cxx);
    println!("   CFLAGS={}", tc.cflags);
    println!("   LDFLAGS={}", tc.ldflags);
    println!("   PKG_CONFIG_PATH={}", tc.pkg_config_value());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
