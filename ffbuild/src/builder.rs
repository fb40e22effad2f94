//! Build invocation: configure, make, make install.
//!
//! The external build system owns all compilation semantics; this module
//! only exports the resolved environment into each child process and
//! propagates failures verbatim. No retry, no partial recovery.

use crate::configure::BuildPlan;
use crate::toolchain::ToolchainEnv;
use anyhow::{Context, Result};
use shared_utils::command::{format_command_error, run_streamed, CapturedCommand};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Seam for the configure/compile/install sequence.
pub trait BuildSystem {
    fn configure(&self, args: &[String]) -> Result<()>;
    fn compile(&self, jobs: usize) -> Result<()>;
    fn install(&self) -> Result<()>;
}

/// Real invoker running FFmpeg's own configure script and make.
pub struct MakeBuilder {
    checkout_dir: PathBuf,
    toolchain: ToolchainEnv,
}

impl MakeBuilder {
    pub fn new(checkout_dir: &Path, toolchain: &ToolchainEnv) -> Self {
        Self {
            checkout_dir: checkout_dir.to_path_buf(),
            toolchain: toolchain.clone(),
        }
    }

    /// Export the resolved toolchain into a child process.
    fn apply_env(&self, cmd: &mut Command) {
        let tc = &self.toolchain;
        cmd.env("PATH", tc.path_value())
            .env("PKG_CONFIG_PATH", tc.pkg_config_value())
            .env("CC", &tc.cc)
            .env("CXX", &tc.cxx)
            .env("CFLAGS", &tc.cflags)
            .env("LDFLAGS", &tc.ldflags)
            .env("MACOSX_DEPLOYMENT_TARGET", &tc.deployment_target);
    }
}

impl BuildSystem for MakeBuilder {
    fn configure(&self, args: &[String]) -> Result<()> {
        info!(args = ?args, "Running configure");

        let mut cmd = Command::new("./configure");
        cmd.args(args).current_dir(&self.checkout_dir);
        self.apply_env(&mut cmd);

        // Configure output is teed into the log; its stderr is drained
        // concurrently so a chatty run cannot deadlock the pipe.
        let mut child = CapturedCommand::spawn(&mut cmd)?;
        if let Some(stdout) = child.take_stdout() {
            for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
                debug!(target: "configure", "{}", line);
            }
        }
        let (status, stderr) = child.wait_with_stderr()?;

        if !status.success() {
            anyhow::bail!("configure failed: {}", format_command_error(&stderr));
        }
        Ok(())
    }

    fn compile(&self, jobs: usize) -> Result<()> {
        let mut cmd = Command::new("make");
        cmd.arg(format!("-j{}", jobs))
            .current_dir(&self.checkout_dir);
        self.apply_env(&mut cmd);
        run_streamed(&mut cmd, "make")
    }

    fn install(&self) -> Result<()> {
        let mut cmd = Command::new("make");
        cmd.arg("install").current_dir(&self.checkout_dir);
        self.apply_env(&mut cmd);
        run_streamed(&mut cmd, "make install")
    }
}

/// Execute the resolved plan: fetch, configure, compile, install. Strictly
/// sequential; each step only starts after the previous one succeeded.
pub fn execute_plan(
    plan: &BuildPlan,
    source: &dyn crate::source::SourceRepository,
    builder: &dyn BuildSystem,
) -> Result<()> {
    shared_utils::ui::print_stage(
        shared_utils::ui::symbols::FOLDER,
        &format!("Fetching FFmpeg ({})", plan.branch),
    );
    source
        .ensure_checkout(&plan.branch)
        .context("Source fetch failed")?;

    shared_utils::ui::print_stage(
        shared_utils::ui::symbols::SEARCH,
        &format!(
            "Configuring for {} ({} optional libraries)",
            plan.arch,
            plan.features.enabled_count()
        ),
    );
    for flag in plan.features.enabled_flags() {
        shared_utils::ui::print_detail(flag);
    }
    builder.configure(&plan.configure_args)?;

    shared_utils::ui::print_stage(
        shared_utils::ui::symbols::HAMMER,
        &format!("Compiling with {} jobs", plan.jobs),
    );
    builder.compile(plan.jobs)?;

    builder.install()?;
    shared_utils::ui::print_success(&format!(
        "Installed into {}",
        plan.paths.output_dir.display()
    ));

    Ok(())
}
