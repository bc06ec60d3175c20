//! Run reporters
//!
//! - `log` - UTC-timestamped plain-text log (best effort)
//! - `junit` - JUnit-style XML report (a required deliverable of the run)
//! - `summary` - markdown step summary, only when a target is configured

pub mod junit;
pub mod log;
pub mod summary;

pub use junit::{render_junit, write_junit, write_junit_to};
pub use log::{render_log, write_log};
pub use summary::{append_summary, render_summary};

/// Indent every non-blank line of `text` by four spaces, dropping trailing whitespace.
pub(crate) fn indent_block(text: &str) -> String {
    text.trim_end()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// First non-blank line of `text`, trimmed.
pub(crate) fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("")
}
