//! External command execution helpers.
//!
//! Everything the orchestrator does happens through external tools (git,
//! pkg-config, make, lipo, zip), so process handling is centralized here.
//!
//! The piped-capture path uses a dedicated thread to drain stderr. When a
//! child writes more stderr than the OS pipe buffer holds (64KB) while the
//! parent only reads stdout, both processes block on each other and the run
//! hangs. FFmpeg's configure script is chatty enough to hit this.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Run a command for its exit status only, with stdio suppressed.
///
/// Used for capability probes (`pkg-config --exists`, `arch -x86_64
/// /usr/bin/true`) where failure to spawn and a non-zero exit mean the same
/// thing: the capability is absent.
pub fn run_quiet_status(cmd: &mut Command) -> bool {
    debug!(command = ?cmd, "Probing");
    cmd.stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run a command with inherited stdio, failing on non-zero exit.
///
/// Used for the long external steps (make, git clone) whose progress the
/// user should see live.
pub fn run_streamed(cmd: &mut Command, what: &str) -> Result<()> {
    info!(command = ?cmd, "Executing {}", what);

    let status = cmd
        .status()
        .with_context(|| format!("Failed to spawn {}", what))?;

    if status.success() {
        info!(exit_code = status.code(), "{} completed", what);
        Ok(())
    } else {
        error!(exit_code = status.code(), "{} failed", what);
        anyhow::bail!("{} failed with status: {}", what, status);
    }
}

/// Run a command and capture its output, failing on non-zero exit with the
/// most meaningful stderr line in the error message.
pub fn run_checked(cmd: &mut Command, what: &str) -> Result<Output> {
    debug!(command = ?cmd, "Executing {}", what);

    let output = cmd
        .output()
        .with_context(|| format!("Failed to spawn {}", what))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        error!(
            command = ?cmd,
            exit_code = ?output.status.code(),
            stderr = %stderr,
            "{} failed",
            what
        );
        anyhow::bail!("{} failed: {}", what, format_command_error(&stderr));
    }

    Ok(output)
}

/// Piped child process wrapper with automatic stderr consumption.
///
/// stdout stays available for line-by-line reading (so output can be teed
/// into the log) while a background thread keeps the stderr pipe drained.
pub struct CapturedCommand {
    child: Child,
    stderr_thread: Option<JoinHandle<String>>,
}

impl CapturedCommand {
    pub fn spawn(cmd: &mut Command) -> Result<Self> {
        info!(command = ?cmd, "Executing command");

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn().context("Failed to spawn process")?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture stderr"))?;

        let stderr_thread = thread::spawn(move || {
            let mut buf = String::new();
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(|l| l.ok()) {
                buf.push_str(&line);
                buf.push('\n');
            }
            buf
        });

        Ok(Self {
            child,
            stderr_thread: Some(stderr_thread),
        })
    }

    /// Take stdout for line-by-line reading.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Wait for the child, returning its exit status and collected stderr.
    pub fn wait_with_stderr(mut self) -> Result<(ExitStatus, String)> {
        let status = self.child.wait().context("Failed to wait for process")?;
        let stderr = self
            .stderr_thread
            .take()
            .map(|t| t.join().unwrap_or_default())
            .unwrap_or_default();

        if status.success() {
            info!(exit_code = status.code(), "Process completed");
        } else {
            error!(
                exit_code = status.code(),
                stderr_output = %stderr,
                "Process failed"
            );
        }

        Ok((status, stderr))
    }
}

/// Extract the most meaningful line from a failed command's stderr.
///
/// Prefers the last line mentioning an error; falls back to the last
/// non-empty line; "Unknown error" when stderr is blank.
pub fn format_command_error(stderr: &str) -> String {
    if let Some(error_line) = stderr
        .lines()
        .rev()
        .find(|line| line.contains("Error") || line.contains("error") || line.contains("fatal:"))
    {
        return error_line.trim().to_string();
    }

    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "Unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_command_error_prefers_error_line() {
        let stderr = "checking for nasm... no\nERROR: libx264 not found using pkg-config\n";
        let msg = format_command_error(stderr);
        assert!(msg.contains("libx264 not found"));
    }

    #[test]
    fn test_format_command_error_git_fatal() {
        let stderr = "Cloning into 'ffmpeg'...\nfatal: unable to access remote\n";
        let msg = format_command_error(stderr);
        assert!(msg.contains("fatal:"));
    }

    #[test]
    fn test_format_command_error_last_nonempty_fallback() {
        let stderr = "\nconfig.mak is unchanged\n\n";
        assert_eq!(format_command_error(stderr), "config.mak is unchanged");
    }

    #[test]
    fn test_format_command_error_empty() {
        assert_eq!(format_command_error(""), "Unknown error");
    }

    #[test]
    fn test_run_quiet_status_missing_binary_is_false() {
        let mut cmd = Command::new("ffbuild-definitely-not-a-real-tool");
        assert!(!run_quiet_status(&mut cmd));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_quiet_status_true() {
        let mut cmd = Command::new("true");
        assert!(run_quiet_status(&mut cmd));
    }

    #[cfg(unix)]
    #[test]
    fn test_captured_command_collects_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2"]);
        let captured = CapturedCommand::spawn(&mut cmd).unwrap();
        let (status, stderr) = captured.wait_with_stderr().unwrap();
        assert!(status.success());
        assert!(stderr.contains("err"));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// For any stderr content the formatted message is non-empty.
        #[test]
        fn prop_format_error_non_empty(content in "[a-zA-Z0-9 \n]{0,200}") {
            let msg = format_command_error(&content);
            prop_assert!(!msg.is_empty());
        }

        /// A line mentioning an error always wins over trailing noise.
        #[test]
        fn prop_format_error_prefers_error_line(
            prefix in "[a-zA-Z ]{0,50}",
            suffix in "[a-zA-Z ]{0,50}"
        ) {
            let stderr = format!("{}\nERROR: something broke\n{}", prefix, suffix);
            let msg = format_command_error(&stderr);
            prop_assert!(msg.contains("ERROR") || msg.contains("error"));
        }
    }
}
