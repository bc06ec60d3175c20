//! Shutdown coordination
//!
//! A [`ShutdownToken`] is created once per run and passed explicitly to
//! everything that spawns or waits on children. The first
//! [`ShutdownToken::request_shutdown`] flips the flag and stops every tracked
//! process; later calls are no-ops.
//!
//! Signals never run this logic in signal context: `ctrlc` turns SIGINT and
//! SIGTERM into a wake-up of its own handler thread, which then calls
//! `request_shutdown` like any other caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::registry::{ProcessHandle, ProcessRegistry};

/// What happened to one tracked process during shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationOutcome {
    Terminated { pid: u32 },
    /// Graceful termination failed; the forced kill went through
    Killed { pid: u32, terminate_error: String },
    /// Both attempts failed; the process may still be running
    Unkillable { pid: u32, kill_error: String },
}

impl TerminationOutcome {
    pub fn pid(&self) -> u32 {
        match self {
            TerminationOutcome::Terminated { pid }
            | TerminationOutcome::Killed { pid, .. }
            | TerminationOutcome::Unkillable { pid, .. } => *pid,
        }
    }
}

#[derive(Default)]
struct ShutdownState {
    requested: AtomicBool,
    processes: ProcessRegistry,
}

/// Cancellation token plus the registry of processes it stops.
#[derive(Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<ShutdownState>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    pub fn processes(&self) -> &ProcessRegistry {
        &self.inner.processes
    }

    /// Mark shutdown and stop every tracked process.
    ///
    /// Returns one outcome per process stopped by this call; a repeat call
    /// returns nothing and changes nothing.
    pub fn request_shutdown(&self) -> Vec<TerminationOutcome> {
        if self.inner.requested.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }
        tracing::info!(tracked = self.inner.processes.len(), "shutdown requested; stopping tracked processes");
        terminate_tracked(&self.inner.processes)
    }
}

/// Stop every process in `registry`, removing each entry once it has been attempted.
pub fn terminate_tracked(registry: &ProcessRegistry) -> Vec<TerminationOutcome> {
    registry
        .snapshot()
        .into_iter()
        .map(|(id, handle)| {
            let outcome = terminate_process(handle.as_ref());
            registry.untrack(id);
            outcome
        })
        .collect()
}

/// Terminate one process, escalating to a forced kill. Never fails; failures are logged.
pub fn terminate_process(handle: &dyn ProcessHandle) -> TerminationOutcome {
    let pid = handle.pid();
    let terminate_error = match handle.terminate() {
        Ok(()) => return TerminationOutcome::Terminated { pid },
        Err(err) => err,
    };

    tracing::warn!(
        pid,
        error = %terminate_error,
        "unable to terminate process {pid}; attempting forced kill. Check permissions or lingering test runs if this persists"
    );

    match handle.kill() {
        Ok(()) => TerminationOutcome::Killed {
            pid,
            terminate_error: terminate_error.to_string(),
        },
        Err(kill_error) => {
            tracing::error!(
                pid,
                error = %kill_error,
                "failed to kill process {pid}. Manually clean up stuck test processes before re-running"
            );
            TerminationOutcome::Unkillable {
                pid,
                kill_error: kill_error.to_string(),
            }
        }
    }
}

/// Route SIGINT/SIGTERM (console Ctrl-C/close on Windows) to `token`.
pub fn install_signal_handlers(token: &ShutdownToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        token.request_shutdown();
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Default)]
    struct MockProcess {
        pid: u32,
        fail_terminate: bool,
        fail_kill: bool,
        terminated: AtomicBool,
        killed: AtomicBool,
    }

    impl MockProcess {
        fn new(pid: u32) -> Arc<Self> {
            Arc::new(Self { pid, ..Default::default() })
        }

        fn broken(pid: u32, fail_kill: bool) -> Arc<Self> {
            Arc::new(Self {
                pid,
                fail_terminate: true,
                fail_kill,
                ..Default::default()
            })
        }

        fn attempted(&self) -> bool {
            self.terminated.load(Ordering::SeqCst) || self.killed.load(Ordering::SeqCst)
        }
    }

    impl ProcessHandle for MockProcess {
        fn pid(&self) -> u32 {
            self.pid
        }

        fn terminate(&self) -> io::Result<()> {
            self.terminated.store(true, Ordering::SeqCst);
            if self.fail_terminate {
                return Err(io::Error::new(io::ErrorKind::NotFound, "process missing"));
            }
            Ok(())
        }

        fn kill(&self) -> io::Result<()> {
            self.killed.store(true, Ordering::SeqCst);
            if self.fail_kill {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "cannot kill"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_request_empties_registry_and_attempts_every_process() {
        let token = ShutdownToken::new();
        let procs = [MockProcess::new(1), MockProcess::broken(2, false), MockProcess::broken(3, true)];
        for process in &procs {
            token.processes().track(process.clone());
        }

        let outcomes = token.request_shutdown();

        assert!(token.is_requested());
        assert!(token.processes().is_empty());
        assert_eq!(outcomes.len(), 3);
        assert!(procs.iter().all(|process| process.attempted()));
        assert!(!procs[0].killed.load(Ordering::SeqCst));
        assert!(procs[1].killed.load(Ordering::SeqCst));
        assert!(procs[2].killed.load(Ordering::SeqCst));
        assert!(matches!(outcomes[0], TerminationOutcome::Terminated { pid: 1 }));
        assert!(matches!(&outcomes[1], TerminationOutcome::Killed { pid: 2, terminate_error } if terminate_error.contains("missing")));
        assert!(matches!(&outcomes[2], TerminationOutcome::Unkillable { pid: 3, kill_error } if kill_error.contains("cannot kill")));
    }

    #[test]
    fn test_request_is_idempotent() {
        let once = ShutdownToken::new();
        let twice = ShutdownToken::new();
        for token in [&once, &twice] {
            token.processes().track(MockProcess::new(5));
        }

        once.request_shutdown();
        twice.request_shutdown();
        let second = twice.request_shutdown();

        assert!(second.is_empty());
        assert_eq!(once.is_requested(), twice.is_requested());
        assert_eq!(once.processes().len(), twice.processes().len());
    }

    #[test]
    fn test_second_request_leaves_newly_tracked_processes_alone() {
        let token = ShutdownToken::new();
        token.request_shutdown();
        let late = MockProcess::new(9);
        token.processes().track(late.clone());
        assert!(token.request_shutdown().is_empty());
        assert!(!late.attempted());
    }

    #[test]
    fn test_clones_share_state() {
        let token = ShutdownToken::new();
        let clone = token.clone();
        clone.processes().track(MockProcess::new(4));
        assert_eq!(token.request_shutdown()[0].pid(), 4);
        assert!(clone.is_requested());
    }

    #[test]
    fn test_request_from_another_thread() {
        let token = ShutdownToken::new();
        let process = MockProcess::new(11);
        token.processes().track(process.clone());
        let remote = token.clone();
        std::thread::spawn(move || remote.request_shutdown()).join().unwrap();
        assert!(process.terminated.load(Ordering::SeqCst));
        assert!(token.processes().is_empty());
    }
}
