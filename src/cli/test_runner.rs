//! Test runner implementation
//!
//! Runs every discovered test strictly in order: compile, then (if the
//! compiler produced an executable) run. Each test ends in one immutable
//! [`TestResult`]. A shutdown request stops the loop; the test it
//! interrupted produces no result. Reports are written over whatever was
//! collected, however the loop ended.
//!
//! ## TestReporter Trait
//!
//! Console progress goes through the `TestReporter` trait, separate from
//! execution and from the artifact reporters in [`crate::report`].

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::test_interfaces::{DefaultTestDiscovery, TestDiscovery, TestExecutor};
use super::{CliError, CliResult, ExitCode};
use crate::config::HarnessConfig;
use crate::discovery::test_name;
use crate::error::{HarnessError, ReportError};
use crate::process::{ProcessExecutor, ProcessOutput, ShutdownToken};
use crate::report::{self, indent_block};
use crate::toolchain::{self, CompileRequest, HostFamily, Toolchain, build_command};

pub use crate::result::{RunSummary, TestResult, TestState};

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Progress callbacks for a run.
pub trait TestReporter {
    /// Called once discovery is complete
    fn on_collection_complete(&mut self, test_count: usize);

    /// Called before a test is compiled
    fn on_test_start(&mut self, _source: &Path) {}

    /// Called when a test has produced its result
    fn on_test_complete(&mut self, result: &TestResult);

    /// Called when shutdown stops the loop; `aborted` is the test it cut short, if any
    fn on_interrupted(&mut self, _aborted: Option<&Path>) {}

    /// Called after the reports have been written
    fn on_run_complete(&mut self, summary: &RunSummary, config: &HarnessConfig);
}

/// Default console reporter
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn print_failure_detail(result: &TestResult) {
        let mut streams = vec![("compile stdout", &result.compile.stdout), ("compile stderr", &result.compile.stderr)];
        if let Some(run) = &result.run {
            streams.push(("run stdout", &run.stdout));
            streams.push(("run stderr", &run.stderr));
        }
        for (label, text) in streams {
            if !text.is_empty() {
                println!("  {label}:\n{}", indent_block(text));
            }
        }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, test_count: usize) {
        if test_count == 0 {
            println!("No tests found.");
        }
    }

    fn on_test_start(&mut self, source: &Path) {
        let file_name = source.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
        println!("Running {file_name}...");
    }

    fn on_test_complete(&mut self, result: &TestResult) {
        if result.passed() {
            println!("  \x1b[32mPASS\x1b[0m");
            return;
        }
        match result.state() {
            TestState::CompileFailed => println!("  \x1b[31mFAIL\x1b[0m (compile exit {})", result.compile.exit_code),
            TestState::Ran { exit_code } => println!("  \x1b[31mFAIL\x1b[0m (exit {exit_code})"),
            TestState::NotRun => println!("  \x1b[31mFAIL\x1b[0m (not run)"),
        }
        if self.verbose {
            Self::print_failure_detail(result);
        }
    }

    fn on_interrupted(&mut self, aborted: Option<&Path>) {
        if aborted.is_some() {
            println!("Shutdown requested. Aborting current test run.");
        } else {
            println!("Shutdown requested. Skipping remaining tests.");
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary, config: &HarnessConfig) {
        if let Some(err) = &summary.error {
            eprintln!("error: {err}");
        }
        if let Some(err) = &summary.report_error {
            eprintln!("warning: {err}");
        }

        let failed = summary.failed_count();
        if failed > 0 {
            println!(
                "\x1b[1;31m{failed} test(s) failed.\x1b[0m See {} for details.",
                config.display_relative(&config.log_path())
            );
        } else if summary.interrupted {
            println!("Test run interrupted before completion.");
        } else if summary.error.is_none() {
            println!("\x1b[1;32mAll {} test(s) passed.\x1b[0m", summary.results.len());
        }
    }
}

// ============================================================================
// Orchestration
// ============================================================================

/// Drives one run over a resolved toolchain.
pub struct TestRunner<'a> {
    config: &'a HarnessConfig,
    toolchain: &'a Toolchain,
    shutdown: &'a ShutdownToken,
    executor: &'a dyn TestExecutor,
    discovery: &'a dyn TestDiscovery,
}

impl<'a> TestRunner<'a> {
    pub fn new(
        config: &'a HarnessConfig,
        toolchain: &'a Toolchain,
        shutdown: &'a ShutdownToken,
        executor: &'a dyn TestExecutor,
    ) -> Self {
        Self {
            config,
            toolchain,
            shutdown,
            executor,
            discovery: &DefaultTestDiscovery,
        }
    }

    pub fn with_discovery(mut self, discovery: &'a dyn TestDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Discover, run every test, then write the reports.
    #[tracing::instrument(skip_all, fields(tests_dir = %self.config.tests_dir.display()))]
    pub fn run(&self, reporter: &mut dyn TestReporter) -> RunSummary {
        let sources = self.discovery.discover(self.config);
        tracing::debug!(count = sources.len(), "discovered test sources");
        reporter.on_collection_complete(sources.len());

        let mut summary = self.run_loop(&sources, reporter);
        summary.report_error = write_reports(self.config, &summary);
        reporter.on_run_complete(&summary, self.config);
        summary
    }

    fn run_loop(&self, sources: &[PathBuf], reporter: &mut dyn TestReporter) -> RunSummary {
        let mut summary = RunSummary::default();

        for source in sources {
            if self.shutdown.is_requested() {
                summary.interrupted = true;
                reporter.on_interrupted(None);
                break;
            }

            reporter.on_test_start(source);
            match self.run_single_test(source) {
                Ok(result) => {
                    reporter.on_test_complete(&result);
                    summary.results.push(result);
                }
                Err(err) if err.is_shutdown() => {
                    summary.interrupted = true;
                    reporter.on_interrupted(Some(source));
                    break;
                }
                Err(err) => {
                    tracing::error!(source = %source.display(), error = %err, "stopping run");
                    summary.error = Some(err);
                    break;
                }
            }
        }

        summary
    }

    /// Compile and run one test source.
    ///
    /// Only shutdown and build-directory failures are returned as errors;
    /// a compiler or executable that cannot be launched is recorded as a
    /// failing result.
    #[tracing::instrument(skip_all, fields(source = %source.display()))]
    pub fn run_single_test(&self, source: &Path) -> Result<TestResult, HarnessError> {
        let name = test_name(source);
        let build_dir = self.config.build_dir();
        fs::create_dir_all(&build_dir).map_err(|source| HarnessError::BuildDir {
            path: build_dir.clone(),
            source,
        })?;
        let executable = build_dir.join(format!("{name}{}", self.toolchain.host.exe_suffix()));
        // An executable left over from an earlier run must not stand in for this compile.
        match fs::remove_file(&executable) {
            Ok(()) => tracing::debug!(executable = %executable.display(), "removed stale executable"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(HarnessError::BuildDir {
                    path: executable.clone(),
                    source,
                });
            }
        }

        let include_dirs = self.config.existing_include_dirs();
        let compile_command = build_command(
            self.toolchain,
            &CompileRequest {
                source,
                output: &executable,
                include_dirs: &include_dirs,
                default_include: &self.config.default_include,
                standard: &self.config.language_standard,
            },
        );
        let compile = self.capture(&compile_command)?;
        let compiled = compile.success() && executable.exists();
        if compile.success() && !compiled {
            tracing::warn!(executable = %executable.display(), "compiler exited 0 without producing the executable");
        }

        let run = if compiled {
            Some(self.capture(&[executable.clone().into_os_string()])?)
        } else {
            None
        };

        Ok(TestResult {
            name,
            source: source.to_path_buf(),
            executable,
            compiled,
            compile,
            run,
        })
    }

    /// Execute `command`, folding launch failures into a failing output.
    fn capture(&self, command: &[OsString]) -> Result<ProcessOutput, HarnessError> {
        match self.executor.execute(command, &self.config.repo_root) {
            Ok(output) => Ok(output),
            Err(err) if err.is_shutdown() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "process could not be run");
                Ok(ProcessOutput::new(-1, "", err.to_string()))
            }
        }
    }
}

/// Write the log, JUnit and summary reports; returns the JUnit failure, if any.
///
/// Log and summary failures are logged and otherwise ignored.
pub fn write_reports(config: &HarnessConfig, summary: &RunSummary) -> Option<ReportError> {
    if let Err(err) = report::write_log(&summary.results, summary.interrupted, config) {
        tracing::warn!("{err}");
    }

    let junit_error = match report::write_junit(&summary.results, config) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "wrote JUnit report");
            None
        }
        Err(err) => Some(err),
    };

    if let Some(path) = &config.summary_path {
        if let Err(err) = report::append_summary(path, &summary.results, summary.interrupted) {
            tracing::warn!("{err}");
        }
    }

    junit_error
}

/// Run all tests configured by `config` using the host toolchain.
pub fn run_tests(config: &HarnessConfig, shutdown: &ShutdownToken, verbose: bool) -> CliResult<ExitCode> {
    let toolchain = toolchain::resolve(HostFamily::current()).map_err(|e| CliError::failure(format!("error: {e}")))?;
    tracing::info!(compiler = %toolchain.describe(), "using toolchain");

    let executor = ProcessExecutor::new(shutdown.clone());
    let mut reporter = ConsoleReporter::new(verbose);
    let summary = TestRunner::new(config, &toolchain, shutdown, &executor).run(&mut reporter);

    match summary.exit_code() {
        0 => Ok(ExitCode::SUCCESS),
        // Summary already printed
        code => Err(CliError::new("", ExitCode(code))),
    }
}
