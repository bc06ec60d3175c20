#![forbid(unsafe_code)]
//! C++ Test Harness
//!
//! Discovers standalone `test_*.cpp` programs, compiles each with the host
//! C++ toolchain, runs the result and writes a plain-text log, a JUnit XML
//! report and an optional markdown step summary for CI.
//!
//! Child processes are tracked while they run so an interrupt can terminate
//! them (and anything they spawned) before the harness exits.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Poisoned locks**: The process registry recovers the guarded map instead of panicking, since it is consulted
//!   from the interrupt handler.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod process;
pub mod report;
pub mod result;
pub mod toolchain;

pub use config::HarnessConfig;
pub use error::{HarnessError, ReportError, ShutdownStage};
pub use process::{ProcessExecutor, ProcessOutput, ProcessRegistry, ShutdownToken};
pub use result::{RunSummary, TestResult, TestState};
pub use toolchain::{HostFamily, Toolchain};
