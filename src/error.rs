//! Error taxonomy shared by the resolver, the executor and the orchestrator.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Where a shutdown request was observed by the process executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStage {
    /// Requested before the child was spawned; nothing was launched
    BeforeStart,
    /// Requested while the child was running; its output is discarded
    DuringExecution,
}

impl fmt::Display for ShutdownStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownStage::BeforeStart => write!(f, "before process start"),
            ShutdownStage::DuringExecution => write!(f, "during process execution"),
        }
    }
}

/// Errors raised while resolving the toolchain or driving child processes
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("no usable compiler found in PATH (tried {}). {remediation}", .candidates.join(", "))]
    ToolchainUnavailable {
        candidates: Vec<String>,
        remediation: &'static str,
    },

    /// Control flow, not a defect: the current test and the rest of the loop are abandoned.
    #[error("shutdown requested {0}")]
    ShutdownRequested(ShutdownStage),

    #[error("failed to launch `{program}`: {source}. Check that it exists and is executable")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to collect output of `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create build directory {}: {source}. Check directory permissions and free disk space", .path.display())]
    BuildDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, HarnessError::ShutdownRequested(_))
    }
}

/// Errors raised by the reporters
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write test log to {}: {source}. Check that the artifacts directory is writable and re-run after freeing disk space", .path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write JUnit report to {}: {source}. Verify disk space and permissions for the artifacts directory", .path.display())]
    Junit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to append step summary to {}: {source}. Check that GITHUB_STEP_SUMMARY points at a writable file", .path.display())]
    Summary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
