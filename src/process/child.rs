//! One owned child process and its exit notification.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::time;

use crate::config::ProcessConfig;
use crate::process::error::{ProcessError, ProcessResult};

/// Executable plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ProcessConfig) -> Self {
        Self::new(config.executable.clone(), config.args.clone())
    }
}

impl fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a child ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessExit {
    /// Reaped normally.
    Exited(ExitStatus),
    /// `wait` itself failed; the child is gone but its status is unknown.
    WaitFailed(String),
    /// The reaper was torn down before reporting.
    Lost,
}

impl ProcessExit {
    pub fn code(&self) -> Option<i32> {
        match self {
            ProcessExit::Exited(status) => status.code(),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessExit::Exited(status) => write!(f, "{}", status),
            ProcessExit::WaitFailed(e) => write!(f, "wait failed: {}", e),
            ProcessExit::Lost => f.write_str("exit status unavailable"),
        }
    }
}

/// Result of a graceful stop.
#[derive(Debug, Clone)]
pub struct StopOutcome {
    pub exit: ProcessExit,
    /// The grace period ran out and SIGKILL was sent.
    pub forced: bool,
}

/// A running (or finished) child in its own process group.
///
/// A background task reaps the child and publishes its exit exactly once
/// on a watch channel, which any number of observers can read.
#[derive(Debug)]
pub struct ManagedProcess {
    pid: u32,
    exit_rx: watch::Receiver<Option<ProcessExit>>,
}

impl ManagedProcess {
    /// Launch `spec` with stdout and stderr inherited from the keeper.
    pub fn spawn(spec: &LaunchSpec) -> ProcessResult<Self> {
        tracing::info!(command = %spec, "Will run command");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .process_group(0);

        let spawn_error = |source| ProcessError::Spawn {
            program: spec.program.clone(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_error)?;
        let pid = child.id().ok_or_else(|| {
            spawn_error(std::io::Error::other("process exited before its pid was read"))
        })?;

        let (exit_tx, exit_rx) = watch::channel(None);
        tokio::spawn(async move {
            let exit = match child.wait().await {
                Ok(status) => ProcessExit::Exited(status),
                Err(e) => ProcessExit::WaitFailed(e.to_string()),
            };
            tracing::debug!(pid, exit = %exit, "Process reaped");
            let _ = exit_tx.send(Some(exit));
        });

        Ok(Self { pid, exit_rx })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Non-blocking liveness probe.
    pub fn is_alive(&self) -> bool {
        self.exit_rx.borrow().is_none()
    }

    /// Exit result, once the child has been reaped.
    pub fn exit(&self) -> Option<ProcessExit> {
        self.exit_rx.borrow().clone()
    }

    /// Wait until the child has been reaped.
    pub async fn wait(&self) -> ProcessExit {
        let mut rx = self.exit_rx.clone();
        let exit = rx.wait_for(Option::is_some).await.map(|exit| exit.clone());
        match exit {
            Ok(Some(exit)) => exit,
            _ => ProcessExit::Lost,
        }
    }

    /// SIGTERM, wait up to `timeout`, then SIGKILL.
    ///
    /// Returns only once the child has been reaped.
    pub async fn stop(&self, timeout: Duration) -> ProcessResult<StopOutcome> {
        if let Some(exit) = self.exit() {
            return Ok(StopOutcome { exit, forced: false });
        }

        tracing::info!(pid = self.pid, timeout = ?timeout, "Sending SIGTERM");
        self.signal(Signal::SIGTERM)
            .map_err(|source| ProcessError::Signal {
                pid: self.pid,
                source,
            })?;

        if let Ok(exit) = time::timeout(timeout, self.wait()).await {
            return Ok(StopOutcome { exit, forced: false });
        }

        tracing::warn!(pid = self.pid, timeout = ?timeout, "Process did not exit in time, sending SIGKILL");
        self.signal(Signal::SIGKILL)
            .map_err(|source| ProcessError::Kill {
                pid: self.pid,
                source,
            })?;

        let exit = self.wait().await;
        Ok(StopOutcome { exit, forced: true })
    }

    fn signal(&self, signal: Signal) -> nix::Result<()> {
        match killpg(Pid::from_raw(self.pid as i32), signal) {
            // Group already gone.
            Err(Errno::ESRCH) => Ok(()),
            result => result,
        }
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if self.is_alive() {
            tracing::warn!(pid = self.pid, "Managed process dropped while running, killing");
            let _ = self.signal(Signal::SIGKILL);
        }
    }
}
