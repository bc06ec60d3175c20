//! Test runner I/O boundary interfaces
//!
//! Discovery and process execution sit behind traits so the orchestrator
//! can be driven by dry runs, scripted fakes or mocks:
//! - `TestDiscovery` - which sources make up the run
//! - `TestExecutor` - how a command line becomes captured output

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::HarnessConfig;
use crate::discovery::discover_test_sources;
use crate::error::HarnessError;
use crate::process::{ProcessExecutor, ProcessOutput};

/// Enumerate the test sources of a run.
pub trait TestDiscovery {
    /// Sorted list of test sources; empty when there is nothing to run.
    fn discover(&self, config: &HarnessConfig) -> Vec<PathBuf>;
}

/// Launch one command and wait for its captured output.
pub trait TestExecutor {
    fn execute(&self, command: &[OsString], cwd: &Path) -> Result<ProcessOutput, HarnessError>;
}

/// Filesystem scan of the configured tests directory.
pub struct DefaultTestDiscovery;

impl TestDiscovery for DefaultTestDiscovery {
    fn discover(&self, config: &HarnessConfig) -> Vec<PathBuf> {
        discover_test_sources(&config.tests_dir, &config.source_prefix, &config.source_extension)
    }
}

impl TestExecutor for ProcessExecutor {
    fn execute(&self, command: &[OsString], cwd: &Path) -> Result<ProcessOutput, HarnessError> {
        self.run(command, cwd)
    }
}
