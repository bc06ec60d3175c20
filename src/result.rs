//! Per-test result records and the aggregate run summary

use std::path::PathBuf;

use crate::error::{HarnessError, ReportError};
use crate::process::ProcessOutput;

/// Where a test ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
    /// Compiler failed or produced no executable
    CompileFailed,
    /// Compiled, but no run was recorded. The orchestrator never builds such
    /// a record (an interrupted run drops the whole result); it only arises
    /// from hand-assembled results.
    NotRun,
    Ran { exit_code: i32 },
}

/// Outcome of compiling and running one test source. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    /// Source file stem; unique within a run
    pub name: String,
    pub source: PathBuf,
    /// Intended compiler output; may not exist when compilation failed
    pub executable: PathBuf,
    /// Compiler exited 0 and the executable exists
    pub compiled: bool,
    pub compile: ProcessOutput,
    pub run: Option<ProcessOutput>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.compiled && self.run_exit_code() == Some(0)
    }

    pub fn compile_exit_code(&self) -> i32 {
        self.compile.exit_code
    }

    pub fn run_exit_code(&self) -> Option<i32> {
        self.run.as_ref().map(|run| run.exit_code)
    }

    pub fn state(&self) -> TestState {
        match (&self.run, self.compiled) {
            (_, false) => TestState::CompileFailed,
            (None, true) => TestState::NotRun,
            (Some(run), true) => TestState::Ran { exit_code: run.exit_code },
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.passed() { "PASS" } else { "FAIL" }
    }
}

/// Everything a finished (or abandoned) run produced
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Results in discovery order
    pub results: Vec<TestResult>,
    /// Shutdown cut the run short
    pub interrupted: bool,
    /// Non-test error that stopped the loop early
    pub error: Option<HarnessError>,
    /// The JUnit report could not be written
    pub report_error: Option<ReportError>,
}

impl RunSummary {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    /// True when every discovered test passed and nothing cut the run short.
    pub fn success(&self) -> bool {
        self.failed_count() == 0 && !self.interrupted && self.error.is_none() && self.report_error.is_none()
    }

    /// Process exit status for the harness: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }
}
