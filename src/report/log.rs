//! Plain-text test log

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::indent_block;
use crate::config::HarnessConfig;
use crate::error::ReportError;
use crate::result::TestResult;

/// Render the log for `results` in discovery order.
pub fn render_log(
    results: &[TestResult],
    interrupted: bool,
    config: &HarnessConfig,
    timestamp: DateTime<Utc>,
) -> String {
    let mut lines = vec![format!("C++ Test Run - {}", timestamp.format("%Y-%m-%dT%H:%M:%SZ")), String::new()];

    for result in results {
        lines.push(format!(
            "[{}] {} ({})",
            result.status_label(),
            result.name,
            config.display_relative(&result.source)
        ));
        lines.push(format!("  Compile return code: {}", result.compile.exit_code));
        push_stream(&mut lines, "Compile stdout", &result.compile.stdout);
        push_stream(&mut lines, "Compile stderr", &result.compile.stderr);
        if result.compiled {
            if let Some(run) = &result.run {
                lines.push(format!("  Run return code: {}", run.exit_code));
                push_stream(&mut lines, "Run stdout", &run.stdout);
                push_stream(&mut lines, "Run stderr", &run.stderr);
            }
        }
        lines.push(String::new());
    }

    if interrupted {
        lines.push("Run interrupted before completion.".to_string());
        lines.push(String::new());
    }

    lines.join("\n") + "\n"
}

fn push_stream(lines: &mut Vec<String>, label: &str, text: &str) {
    if !text.is_empty() {
        lines.push(format!("  {label}:\n{}", indent_block(text)));
    }
}

/// Write the log into the artifacts directory, returning its path.
pub fn write_log(results: &[TestResult], interrupted: bool, config: &HarnessConfig) -> Result<PathBuf, ReportError> {
    let path = config.log_path();
    let contents = render_log(results, interrupted, config, Utc::now());
    fs::create_dir_all(&config.artifact_dir)
        .and_then(|()| fs::write(&path, contents))
        .map_err(|source| ReportError::Log {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
