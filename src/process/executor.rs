//! Child process execution with shutdown tracking
//!
//! Every child runs in its own process group so terminal signals reach
//! only the harness; the harness stops children itself through the
//! [`ShutdownToken`].

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;

use super::registry::ProcessHandle;
use super::shutdown::{ShutdownToken, terminate_process};
use crate::error::{HarnessError, ShutdownStage};

/// Captured result of one finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Launches children and tracks them for the lifetime of the wait.
#[derive(Clone)]
pub struct ProcessExecutor {
    shutdown: ShutdownToken,
}

impl ProcessExecutor {
    pub fn new(shutdown: ShutdownToken) -> Self {
        Self { shutdown }
    }

    /// Run `command` in `cwd` and capture its output.
    ///
    /// Fails with `ShutdownRequested` without spawning if shutdown is already
    /// active, and fails the same way after the child exits if shutdown was
    /// requested while it ran.
    pub fn run(&self, command: &[OsString], cwd: &Path) -> Result<ProcessOutput, HarnessError> {
        if self.shutdown.is_requested() {
            return Err(HarnessError::ShutdownRequested(ShutdownStage::BeforeStart));
        }

        let Some((program, args)) = command.split_first() else {
            return Err(HarnessError::Spawn {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command line"),
            });
        };
        let program_name = program.to_string_lossy().into_owned();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        detach_from_session(&mut cmd);

        let child = cmd.spawn().map_err(|source| HarnessError::Spawn {
            program: program_name.clone(),
            source,
        })?;
        tracing::debug!(pid = child.id(), program = %program_name, "spawned child");

        let handle: Arc<dyn ProcessHandle> = Arc::new(ChildProcess::new(child.id()));
        let waited = {
            let _tracked = self.shutdown.processes().track_scoped(Arc::clone(&handle));
            // A request that landed between the precheck and tracking missed this child.
            if self.shutdown.is_requested() {
                terminate_process(handle.as_ref());
            }
            child.wait_with_output()
        };

        if self.shutdown.is_requested() {
            return Err(HarnessError::ShutdownRequested(ShutdownStage::DuringExecution));
        }

        let output = waited.map_err(|source| HarnessError::Wait {
            program: program_name,
            source,
        })?;

        Ok(ProcessOutput {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Exit code of a finished child; `-signal` when a signal ended it.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

#[cfg(unix)]
fn detach_from_session(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach_from_session(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_session(_cmd: &mut Command) {}

/// OS process addressed by pid (and, on unix, by its process group)
#[derive(Debug, Clone, Copy)]
pub struct ChildProcess {
    pid: u32,
}

impl ChildProcess {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }
}

#[cfg(unix)]
impl ChildProcess {
    fn signal_group(&self, signal: nix::sys::signal::Signal) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::killpg;
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(self.pid) else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("pid {} out of range", self.pid)));
        };
        match killpg(Pid::from_raw(raw), signal) {
            // Group already gone: the child exited and was reaped.
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }
}

#[cfg(unix)]
impl ProcessHandle for ChildProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn terminate(&self) -> io::Result<()> {
        self.signal_group(nix::sys::signal::Signal::SIGTERM)
    }

    fn kill(&self) -> io::Result<()> {
        self.signal_group(nix::sys::signal::Signal::SIGKILL)
    }
}

#[cfg(windows)]
impl ChildProcess {
    fn taskkill(&self, force: bool) -> io::Result<()> {
        let mut cmd = Command::new("taskkill");
        cmd.args(["/PID", &self.pid.to_string(), "/T"]);
        if force {
            cmd.arg("/F");
        }
        let status = cmd.stdout(Stdio::null()).stderr(Stdio::null()).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("taskkill exited with {status}")))
        }
    }
}

#[cfg(windows)]
impl ProcessHandle for ChildProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn terminate(&self) -> io::Result<()> {
        self.taskkill(false)
    }

    fn kill(&self) -> io::Result<()> {
        self.taskkill(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<OsString> {
        parts.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_shutdown_before_start_spawns_nothing() {
        let token = ShutdownToken::new();
        token.request_shutdown();
        let executor = ProcessExecutor::new(token.clone());

        // A nonexistent program proves no spawn was attempted.
        let err = executor.run(&args(&["definitely-not-a-real-program-xyz"]), Path::new(".")).unwrap_err();

        assert!(matches!(err, HarnessError::ShutdownRequested(ShutdownStage::BeforeStart)));
        assert!(token.processes().is_empty());
    }

    #[test]
    fn test_empty_command_is_spawn_error() {
        let executor = ProcessExecutor::new(ShutdownToken::new());
        let err = executor.run(&[], Path::new(".")).unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let token = ShutdownToken::new();
        let executor = ProcessExecutor::new(token.clone());
        let err = executor.run(&args(&["definitely-not-a-real-program-xyz"]), Path::new(".")).unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }));
        assert!(token.processes().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_streams_and_exit_code() {
        let token = ShutdownToken::new();
        let executor = ProcessExecutor::new(token.clone());
        let output = executor
            .run(&args(&["sh", "-c", "echo out; echo err >&2; exit 3"]), Path::new("."))
            .unwrap();
        assert_eq!(output, ProcessOutput::new(3, "out\n", "err\n"));
        assert!(!output.success());
        assert!(token.processes().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_working_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = ProcessExecutor::new(ShutdownToken::new());
        let output = executor.run(&args(&["sh", "-c", "ls"]), tmp.path()).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "");
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_exit_is_negative() {
        let executor = ProcessExecutor::new(ShutdownToken::new());
        let output = executor.run(&args(&["sh", "-c", "kill -9 $$"]), Path::new(".")).unwrap();
        assert_eq!(output.exit_code, -9);
    }

    #[cfg(unix)]
    #[test]
    fn test_shutdown_during_wait_stops_child() {
        use std::time::{Duration, Instant};

        let token = ShutdownToken::new();
        let executor = ProcessExecutor::new(token.clone());
        let remote = token.clone();
        let trigger = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            remote.request_shutdown()
        });

        let started = Instant::now();
        let err = executor.run(&args(&["sh", "-c", "sleep 30"]), Path::new(".")).unwrap_err();
        let outcomes = trigger.join().unwrap();

        assert!(err.is_shutdown());
        assert!(started.elapsed() < Duration::from_secs(20));
        assert!(token.processes().is_empty());
        assert!(outcomes.len() <= 1);
    }
}
