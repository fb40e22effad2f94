//! Shared Utilities for the ffbuild tool
//!
//! This crate provides the ambient plumbing the build orchestrator sits on:
//! - Common logging setup (file + stderr via tracing)
//! - External command execution helpers
//! - External tools detection (git, make, pkg-config, ...)
//! - Filesystem helpers (idempotent dirs, stale-directory relocation)
//! - Terminal status output

pub mod command;
pub mod fsutil;
pub mod logging;
pub mod tools;
pub mod ui;

pub use command::{
    format_command_error, run_checked, run_quiet_status, run_streamed, CapturedCommand,
};
pub use fsutil::{absolutize, ensure_dir_exists, move_aside};
pub use tools::{check_required_tools, optional_tool, require_tool, ToolCheck};
pub use ui::{print_detail, print_error, print_stage, print_success, print_warning, symbols};
