//! Markdown step summary for CI

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::ReportError;
use crate::result::TestResult;

pub fn render_summary(results: &[TestResult], interrupted: bool) -> String {
    let passed = results.iter().filter(|r| r.passed()).count();
    let failed = results.len() - passed;

    let mut lines = vec![
        "## C++ Test Summary".to_string(),
        String::new(),
        format!("* Total: {}", results.len()),
        format!("* Passed: {passed}"),
        format!("* Failed: {failed}"),
    ];
    if interrupted {
        lines.push("* Interrupted before completion".to_string());
    }
    lines.push(String::new());
    lines.push("| Test | Status |".to_string());
    lines.push("| --- | --- |".to_string());
    for result in results {
        let status = if result.passed() { "✅ Pass" } else { "❌ Fail" };
        lines.push(format!("| `{}` | {status} |", result.name));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Append the summary to `path`, creating the file if needed.
pub fn append_summary(path: &Path, results: &[TestResult], interrupted: bool) -> Result<(), ReportError> {
    let summary = render_summary(results, interrupted);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(summary.as_bytes()))
        .map_err(|source| ReportError::Summary {
            path: path.to_path_buf(),
            source,
        })
}
