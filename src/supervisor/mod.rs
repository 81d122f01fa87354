//! Lifecycle management for a single supervised process
//!
//! A [`ProcessSupervisor`] owns one [`ProcessSpec`] and the OS process
//! launched from it, if any. Starting resolves a fresh log file through the
//! rotator and launches the command with stdout and stderr redirected into
//! that file as one combined stream. Stopping asks the process to terminate
//! and waits a bounded time before killing it outright.

mod error;

pub use error::{StartError, StopError, ToggleError};

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::config::ProcessSpec;
use crate::rotation::LogRotator;

/// Time a stopped process gets to exit after the termination request
/// before it is killed outright
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Lifecycle state of a supervised process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    /// No process is running
    Stopped,
    /// A process was launched and has not been stopped yet
    Running,
    /// The last start or stop failed; the reason is shown to the operator
    Failed(String),
}

impl ProcessStatus {
    /// Whether this status counts as running for toggle purposes
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Stopped => write!(f, "Stopped"),
            ProcessStatus::Running => write!(f, "Running"),
            ProcessStatus::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

/// Owns one process specification and the OS process launched from it
pub struct ProcessSupervisor {
    /// Immutable specification from configuration
    spec: ProcessSpec,

    /// Names the log file for each start and prunes old ones
    rotator: LogRotator,

    /// Bounded wait applied in `stop` between the termination request and
    /// the kill fallback
    grace: Duration,

    status: ProcessStatus,

    /// Present iff `status` is `Running`
    child: Option<Child>,

    /// Log file chosen for the current or most recent start
    log_file: Option<PathBuf>,
}

impl ProcessSupervisor {
    /// Create a supervisor for `spec`, initially stopped
    pub fn new(spec: ProcessSpec, rotator: LogRotator) -> Self {
        Self {
            spec,
            rotator,
            grace: DEFAULT_STOP_GRACE,
            status: ProcessStatus::Stopped,
            child: None,
            log_file: None,
        }
    }

    /// Override the graceful-termination wait used by `stop`
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Display name from the specification
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The immutable process specification
    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    /// Current lifecycle state. Pure read: a child that exited on its own
    /// still reads `Running` until `stop` observes it.
    pub fn status(&self) -> &ProcessStatus {
        &self.status
    }

    /// Log file of the current or most recent start, if any
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// OS process id while running
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    /// Whether an OS handle is currently held
    pub fn has_handle(&self) -> bool {
        self.child.is_some()
    }

    /// Launch the configured command, redirecting its output to a fresh
    /// log file.
    ///
    /// A supervisor that is already `Running` is left alone and `Ok` is
    /// returned. Any failure records `Failed(reason)` so the operator sees
    /// what went wrong and may retry.
    pub async fn start(&mut self) -> Result<(), StartError> {
        if self.status.is_running() {
            debug!("{} is already running", self.spec.name);
            return Ok(());
        }

        let words = match shell_words::split(&self.spec.cmd) {
            Ok(words) => words,
            Err(e) => {
                self.status = ProcessStatus::Failed(format!("invalid command line: {}", e));
                return Err(e.into());
            }
        };
        let Some((program, args)) = words.split_first() else {
            self.status = ProcessStatus::Failed("command is empty".to_string());
            return Err(StartError::EmptyCommand);
        };

        let log_path = self.rotator.next_log_path(&self.spec.name);
        let (out, err) = match open_log(&log_path) {
            Ok(files) => files,
            Err(e) => {
                self.status =
                    ProcessStatus::Failed(format!("could not open log file: {}", e));
                return Err(StartError::LogFile {
                    path: log_path,
                    source: e,
                });
            }
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::from(err));
        if let Some(cwd) = &self.spec.cwd {
            command.current_dir(cwd);
        }

        match command.spawn() {
            Ok(child) => {
                info!(
                    "Started {} (pid {:?}), logging to {}",
                    self.spec.name,
                    child.id(),
                    log_path.display()
                );
                self.child = Some(child);
                self.log_file = Some(log_path);
                self.status = ProcessStatus::Running;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to start {}: {}", self.spec.name, e);
                // The already-created log file stays behind for diagnosis.
                self.log_file = Some(log_path);
                self.status = ProcessStatus::Failed(e.to_string());
                Err(StartError::Spawn(e))
            }
        }
    }

    /// Ask the running process to terminate, waiting up to the stop grace
    /// before killing it.
    ///
    /// A supervisor with no live handle returns `Ok` unchanged. A process
    /// that already exited on its own is reaped and counts as a normal stop.
    pub async fn stop(&mut self) -> Result<(), StopError> {
        let Some(mut child) = self.child.take() else {
            debug!("{} is not running", self.spec.name);
            return Ok(());
        };

        request_termination(&self.spec.name, &mut child);

        match timeout(self.grace, child.wait()).await {
            Ok(Ok(exit)) => {
                info!("Stopped {} ({})", self.spec.name, exit);
                self.status = ProcessStatus::Stopped;
                Ok(())
            }
            Ok(Err(e)) => {
                // The OS no longer tracks the child; treat it as gone but
                // surface the error.
                warn!("Failed waiting for {} to exit: {}", self.spec.name, e);
                self.status = ProcessStatus::Stopped;
                Err(StopError::Wait(e))
            }
            Err(_) => {
                warn!(
                    "{} did not exit within {:?}, killing",
                    self.spec.name, self.grace
                );
                match child.kill().await {
                    Ok(()) => {
                        self.status = ProcessStatus::Stopped;
                        Ok(())
                    }
                    Err(e) => {
                        self.status =
                            ProcessStatus::Failed(format!("could not kill process: {}", e));
                        Err(StopError::Kill(self.grace, e))
                    }
                }
            }
        }
    }

    /// Stop when running, start otherwise
    pub async fn toggle(&mut self) -> Result<(), ToggleError> {
        if self.status.is_running() {
            self.stop().await?;
        } else {
            self.start().await?;
        }
        Ok(())
    }

    /// Shutdown-time stop that never propagates errors. Idempotent.
    pub async fn cleanup(&mut self) {
        if !self.status.is_running() {
            return;
        }
        if let Err(e) = self.stop().await {
            warn!("Shutdown of {} failed: {}", self.spec.name, e);
        }
    }
}

/// Open the log file twice, once for each output stream; both handles point
/// at the same file so output stays interleaved in write order
fn open_log(path: &Path) -> std::io::Result<(File, File)> {
    let out = File::create(path)?;
    let err = out.try_clone()?;
    Ok((out, err))
}

/// Send a graceful termination request; failures (typically a process that
/// already exited) are logged and the caller's wait proceeds
fn request_termination(name: &str, child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!("SIGTERM to {} (pid {}) failed: {}", name, pid, e);
            }
        }
    }

    #[cfg(not(unix))]
    {
        // No portable graceful signal; fall back to a kill request and let
        // the caller's wait reap the process.
        if let Err(e) = child.start_kill() {
            debug!("Kill request for {} failed: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn supervisor(dir: &Path, name: &str, cmd: &str) -> ProcessSupervisor {
        let spec = ProcessSpec {
            name: name.to_string(),
            cmd: cmd.to_string(),
            cwd: None,
        };
        ProcessSupervisor::new(spec, LogRotator::new(dir, 5))
    }

    #[tokio::test]
    async fn test_start_and_stop_track_the_handle() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "sleeper", "sleep 30");

        assert_eq!(*sup.status(), ProcessStatus::Stopped);
        assert!(!sup.has_handle());

        sup.start().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Running);
        assert!(sup.has_handle());
        assert!(sup.log_file().is_some());

        sup.stop().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Stopped);
        assert!(!sup.has_handle());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "sleeper", "sleep 30");

        sup.start().await.unwrap();
        let pid = sup.pid().unwrap();
        let log = sup.log_file().unwrap().to_path_buf();

        // Second start is a no-op: same process, same log file.
        sup.start().await.unwrap();
        assert_eq!(sup.pid(), Some(pid));
        assert_eq!(sup.log_file(), Some(log.as_path()));

        sup.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "sleeper", "sleep 30");

        sup.stop().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Stopped);

        sup.start().await.unwrap();
        sup.stop().await.unwrap();
        sup.stop().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Stopped);
    }

    #[tokio::test]
    async fn test_toggle_alternates_status() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "sleeper", "sleep 30");

        sup.toggle().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Running);
        sup.toggle().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Stopped);
        sup.toggle().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Running);
        sup.toggle().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Stopped);
    }

    #[tokio::test]
    async fn test_missing_binary_fails_then_recovers() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("later.sh");
        let mut sup = supervisor(dir.path(), "late", script.to_str().unwrap());

        // The script does not exist yet.
        let err = sup.start().await.unwrap_err();
        assert!(matches!(err, StartError::Spawn(_)));
        assert!(matches!(sup.status(), ProcessStatus::Failed(_)));
        assert!(!sup.has_handle());

        // Correct the situation and retry: Failed is not sticky.
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        sup.start().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Running);
        sup.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_command_is_a_start_error() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "empty", "   ");

        let err = sup.start().await.unwrap_err();
        assert!(matches!(err, StartError::EmptyCommand));
        assert!(matches!(sup.status(), ProcessStatus::Failed(_)));
        assert!(!sup.has_handle());
    }

    #[tokio::test]
    async fn test_output_goes_to_the_log_file() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(
            dir.path(),
            "echoer",
            "sh -c 'echo out-line; echo err-line >&2'",
        );

        sup.start().await.unwrap();
        let log = sup.log_file().unwrap().to_path_buf();
        // stop() waits for exit, after which the log is complete.
        sup.stop().await.unwrap();

        let contents = std::fs::read_to_string(&log).unwrap();
        assert!(contents.contains("out-line"));
        assert!(contents.contains("err-line"));
    }

    #[tokio::test]
    async fn test_cwd_is_honored() {
        let dir = tempdir().unwrap();
        let work = tempdir().unwrap();
        let spec = ProcessSpec {
            name: "pwd".to_string(),
            cmd: "pwd".to_string(),
            cwd: Some(work.path().to_string_lossy().into_owned()),
        };
        let mut sup = ProcessSupervisor::new(spec, LogRotator::new(dir.path(), 5));

        sup.start().await.unwrap();
        let log = sup.log_file().unwrap().to_path_buf();
        sup.stop().await.unwrap();

        let contents = std::fs::read_to_string(&log).unwrap();
        let canonical = work.path().canonicalize().unwrap();
        assert!(contents.trim_end().ends_with(canonical.to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_stubborn_process_is_killed_within_the_grace() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "stubborn", "sh -c 'trap \"\" TERM; sleep 30'")
            .with_stop_grace(Duration::from_millis(200));

        sup.start().await.unwrap();
        // Give the shell a moment to install its trap.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let began = std::time::Instant::now();
        sup.stop().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Stopped);
        assert!(began.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_stop_after_child_exited_on_its_own() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "brief", "true");

        sup.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // status() is a pure read; the exit has not been observed yet.
        assert_eq!(*sup.status(), ProcessStatus::Running);

        sup.stop().await.unwrap();
        assert_eq!(*sup.status(), ProcessStatus::Stopped);
        assert!(!sup.has_handle());
    }

    #[tokio::test]
    async fn test_each_start_gets_a_fresh_log_file() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "sleeper", "sleep 30");

        sup.start().await.unwrap();
        let first = sup.log_file().unwrap().to_path_buf();
        sup.stop().await.unwrap();

        sup.start().await.unwrap();
        let second = sup.log_file().unwrap().to_path_buf();
        sup.stop().await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut sup = supervisor(dir.path(), "sleeper", "sleep 30");

        sup.start().await.unwrap();
        sup.cleanup().await;
        assert_eq!(*sup.status(), ProcessStatus::Stopped);
        sup.cleanup().await;
        assert_eq!(*sup.status(), ProcessStatus::Stopped);
    }
}
