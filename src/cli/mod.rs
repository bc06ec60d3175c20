//! CLI module for the test harness
//!
//! ## Modules
//!
//! - `test_runner` - Orchestration of compile and run per test, console progress
//! - `test_interfaces` - Discovery and execution seams
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod test_interfaces;
pub mod test_runner;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use crate::config::HarnessConfig;
use crate::process::{ShutdownToken, install_signal_handlers};
use test_interfaces::{DefaultTestDiscovery, TestDiscovery};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Compile and run standalone C++ tests, then write text, JUnit and CI summary reports
#[derive(Parser, Debug)]
#[command(name = "cxxtest")]
#[command(version = VERSION)]
#[command(about = "Compile and run standalone C++ tests", long_about = None)]
pub struct Cli {
    /// Repository root; compilers and tests run with it as working directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Directory holding test_*.cpp sources (default: <ROOT>/tests)
    #[arg(long = "tests-dir", value_name = "DIR")]
    pub tests_dir: Option<PathBuf>,

    /// Directory for the log, the JUnit report and compiled tests
    /// (default: <ROOT>/artifacts/test-results)
    #[arg(long = "artifacts-dir", value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Include directory; repeat to add more (replaces the default src, src/fmt, src/json)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub include: Vec<PathBuf>,

    /// Append a markdown summary to this file
    #[arg(long, value_name = "PATH", env = "GITHUB_STEP_SUMMARY")]
    pub summary: Option<OsString>,

    /// Print captured output of failing tests
    #[arg(short, long)]
    pub verbose: bool,

    /// List discovered tests without compiling anything
    #[arg(long)]
    pub list: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = build_config(&cli)?;

    if cli.list {
        return list_tests(&config);
    }

    let shutdown = ShutdownToken::new();
    if let Err(e) = install_signal_handlers(&shutdown) {
        tracing::warn!(error = %e, "could not install signal handlers; interrupting may leave test processes running");
    }

    test_runner::run_tests(&config, &shutdown, cli.verbose)
}

/// Turn parsed flags into a configuration with absolute paths.
///
/// Children run with the root as working directory, so every path handed
/// to them must not depend on the harness's own working directory.
pub fn build_config(cli: &Cli) -> CliResult<HarnessConfig> {
    let root = absolute(&cli.root)?;
    let mut config = HarnessConfig::for_root(root);

    if let Some(dir) = &cli.tests_dir {
        config = config.with_tests_dir(absolute(dir)?);
    }
    if let Some(dir) = &cli.artifacts_dir {
        config = config.with_artifact_dir(absolute(dir)?);
    }
    if !cli.include.is_empty() {
        let dirs = cli.include.iter().map(|dir| absolute(dir)).collect::<CliResult<Vec<_>>>()?;
        config = config.with_include_dirs(dirs);
    }

    // CI runners may export the variable empty; that disables the summary too.
    let summary = cli.summary.as_ref().filter(|value| !value.is_empty()).map(PathBuf::from);
    Ok(config.with_summary_path(summary))
}

fn absolute(dir: &Path) -> CliResult<PathBuf> {
    std::path::absolute(dir)
        .map_err(|e| CliError::failure(format!("error: cannot resolve path {}: {e}", dir.display())))
}

/// Print discovered tests (dry run).
fn list_tests(config: &HarnessConfig) -> CliResult<ExitCode> {
    let sources = DefaultTestDiscovery.discover(config);
    if sources.is_empty() {
        println!("No tests found.");
    }
    for source in &sources {
        println!("{}", config.display_relative(source));
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Tests
// ============================================================================
