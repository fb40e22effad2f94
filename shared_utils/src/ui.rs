//! 终端状态输出
//!
//! 构建各阶段的状态行输出，统一的符号与颜色。

use console::style;

/// Unicode 符号
pub mod symbols {
    pub const CHECK: &str = "✓";
    pub const ARROW_RIGHT: &str = "→";
    pub const BULLET: &str = "•";
    pub const SEARCH: &str = "🔍";
    pub const FOLDER: &str = "📁";
    pub const HAMMER: &str = "🔨";
    pub const PACKAGE: &str = "📦";
    pub const WARNING: &str = "⚠️";
    pub const ERROR: &str = "❌";
    pub const SUCCESS: &str = "✅";
}

/// Print a top-level pipeline stage header.
pub fn print_stage(emoji: &str, title: &str) {
    eprintln!();
    eprintln!("{} {}", emoji, style(title).cyan().bold());
}

pub fn print_success(msg: &str) {
    eprintln!("{} {}", symbols::SUCCESS, style(msg).green());
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", symbols::WARNING, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", symbols::ERROR, style(msg).red().bold());
}

/// Indented detail line under a stage header.
pub fn print_detail(msg: &str) {
    eprintln!("   {} {}", symbols::BULLET, msg);
}
