//! JUnit-style XML report
//!
//! One `<testsuite>` element with a `<testcase>` per result; failing cases
//! carry a `<failure>` whose `message` condenses the captured streams and
//! whose body holds them in full.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::first_line;
use crate::config::HarnessConfig;
use crate::error::ReportError;
use crate::result::TestResult;

/// Render the report document.
pub fn render_junit(results: &[TestResult], suite_name: &str, classname: &str) -> String {
    let failures = results.iter().filter(|r| !r.passed()).count();
    let mut output = String::new();

    output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    output.push_str(&format!(
        "<testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\">\n",
        escape_xml(suite_name),
        results.len(),
        failures
    ));

    for result in results {
        let open = format!(
            "  <testcase name=\"{}\" classname=\"{}\"",
            escape_xml(&result.name),
            escape_xml(classname)
        );
        if result.passed() {
            output.push_str(&open);
            output.push_str(" />\n");
            continue;
        }

        let sections = failure_sections(result);
        let message = sections.iter().map(|s| s.summary.as_str()).collect::<Vec<_>>().join("; ");
        let body = sections.iter().map(|s| s.detail.as_str()).collect::<Vec<_>>().join("\n");

        output.push_str(&open);
        output.push_str(">\n");
        output.push_str(&format!(
            "    <failure message=\"{}\">{}</failure>\n",
            escape_xml(&message),
            escape_xml(&body)
        ));
        output.push_str("  </testcase>\n");
    }

    output.push_str("</testsuite>\n");
    output
}

struct FailureSection {
    summary: String,
    detail: String,
}

impl FailureSection {
    fn code(label: &str, code: i32) -> Self {
        let line = format!("{label} return code: {code}");
        Self {
            summary: line.clone(),
            detail: line,
        }
    }

    fn stream(label: &str, text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        Some(Self {
            summary: format!("{label}: {}", first_line(text)),
            detail: format!("{label}:\n{text}"),
        })
    }
}

fn failure_sections(result: &TestResult) -> Vec<FailureSection> {
    let mut sections = vec![FailureSection::code("Compile", result.compile.exit_code)];
    sections.extend(FailureSection::stream("Compile stdout", &result.compile.stdout));
    sections.extend(FailureSection::stream("Compile stderr", &result.compile.stderr));
    if result.compiled {
        if let Some(run) = &result.run {
            sections.push(FailureSection::code("Run", run.exit_code));
            sections.extend(FailureSection::stream("Run stdout", &run.stdout));
            sections.extend(FailureSection::stream("Run stderr", &run.stderr));
        }
    }
    sections
}

/// Escape markup characters and replace characters XML 1.0 cannot carry.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if c < ' ' || c == '\u{FFFE}' || c == '\u{FFFF}' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    out
}

/// Write the report to `writer`; `path` only names the destination in errors.
pub fn write_junit_to<W: Write>(
    writer: &mut W,
    results: &[TestResult],
    config: &HarnessConfig,
    path: &Path,
) -> Result<(), ReportError> {
    let document = render_junit(results, &config.suite_name, &config.classname);
    writer
        .write_all(document.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|source| ReportError::Junit {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the report into the artifacts directory, returning its path.
pub fn write_junit(results: &[TestResult], config: &HarnessConfig) -> Result<PathBuf, ReportError> {
    let path = config.junit_path();
    let file = fs::create_dir_all(&config.artifact_dir)
        .and_then(|()| File::create(&path))
        .map_err(|source| ReportError::Junit {
            path: path.clone(),
            source,
        })?;
    write_junit_to(&mut BufWriter::new(file), results, config, &path)?;
    Ok(path)
}
