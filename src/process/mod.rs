//! Child process lifecycle: execution, tracking and shutdown
//!
//! - `registry` - concurrency-safe set of live children
//! - `shutdown` - cancellation token, termination escalation, signal wiring
//! - `executor` - spawn, wait and capture under the token's supervision

pub mod executor;
pub mod registry;
pub mod shutdown;

pub use executor::{ChildProcess, ProcessExecutor, ProcessOutput};
pub use registry::{ProcessHandle, ProcessRegistry, TrackGuard, TrackingId};
pub use shutdown::{ShutdownToken, TerminationOutcome, install_signal_handlers, terminate_process, terminate_tracked};
