//! Harness configuration
//!
//! Every fixed path, naming pattern and report name the harness relies on
//! lives here so the orchestrator and reporters never hard-code them.

use std::path::{Path, PathBuf};

/// Configuration for one harness run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Repository root; working directory of every child process
    pub repo_root: PathBuf,
    /// Directory scanned (non-recursively) for test sources
    pub tests_dir: PathBuf,
    /// Filename prefix a test source must carry
    pub source_prefix: String,
    /// Extension (without the dot) a test source must carry
    pub source_extension: String,
    /// Include roots passed to the compiler when they exist on disk
    pub include_dirs: Vec<PathBuf>,
    /// Include root used when none of `include_dirs` exist
    pub default_include: PathBuf,
    /// Language standard passed to the compiler (e.g. `c++20`)
    pub language_standard: String,
    /// Directory receiving the log, the JUnit report and the build outputs
    pub artifact_dir: PathBuf,
    pub log_file_name: String,
    pub junit_file_name: String,
    pub build_dir_name: String,
    /// `name` attribute of the JUnit test suite
    pub suite_name: String,
    /// `classname` attribute of every JUnit test case
    pub classname: String,
    /// Markdown step summary target; `None` disables the summary reporter
    pub summary_path: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::for_root(".")
    }
}

impl HarnessConfig {
    /// Build the default layout rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let repo_root = root.into();
        let src = repo_root.join("src");
        Self {
            tests_dir: repo_root.join("tests"),
            source_prefix: "test_".to_string(),
            source_extension: "cpp".to_string(),
            include_dirs: vec![src.clone(), src.join("fmt"), src.join("json")],
            default_include: src,
            language_standard: "c++20".to_string(),
            artifact_dir: repo_root.join("artifacts").join("test-results"),
            log_file_name: "test-log.txt".to_string(),
            junit_file_name: "junit.xml".to_string(),
            build_dir_name: "build".to_string(),
            suite_name: "cpp-tests".to_string(),
            classname: "cpp".to_string(),
            summary_path: None,
            repo_root,
        }
    }

    /// Set the directory scanned for test sources
    pub fn with_tests_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tests_dir = dir.into();
        self
    }

    /// Replace the configured include roots
    pub fn with_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.include_dirs = dirs;
        self
    }

    /// Set the artifacts directory
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Set (or clear) the step summary target
    pub fn with_summary_path(mut self, path: Option<PathBuf>) -> Self {
        self.summary_path = path;
        self
    }

    pub fn log_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.log_file_name)
    }

    pub fn junit_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.junit_file_name)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.artifact_dir.join(&self.build_dir_name)
    }

    /// Include roots that currently exist on disk, in configured order.
    pub fn existing_include_dirs(&self) -> Vec<PathBuf> {
        self.include_dirs.iter().filter(|dir| dir.exists()).cloned().collect()
    }

    /// Render `path` relative to the repository root when possible.
    pub fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.repo_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
