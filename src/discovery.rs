//! Test source discovery

use std::fs;
use std::path::{Path, PathBuf};

/// List test sources directly under `root` named `<prefix>*.<extension>`.
///
/// A missing root yields an empty list: zero tests is a valid run.
/// The result is sorted by path.
pub fn discover_test_sources(root: &Path, prefix: &str, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        tracing::debug!(root = %root.display(), "tests root not readable; no tests discovered");
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_test_source(path, prefix, extension))
        .collect();

    files.sort();
    files
}

fn is_test_source(path: &Path, prefix: &str, extension: &str) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    name.starts_with(prefix) && ext == extension
}

/// Test name for a source: its file stem.
pub fn test_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}
