//! Single-slot process supervisor.
//!
//! # States
//! ```text
//! NotStarted ──start──▶ Running ──stop──▶ Stopping ──▶ Stopped ──start──▶ Running
//!                          │
//!                          └── exit seen by check_liveness ──▶ CrashedUnexpectedly
//! ```
//!
//! At most one child exists at a time: `start` refuses while a child is
//! alive, and `restart` fully reaps the old child before spawning.

use std::time::Duration;

use crate::config::ProcessConfig;
use crate::observability::metrics;
use crate::process::child::{LaunchSpec, ManagedProcess, ProcessExit};
use crate::process::error::{ProcessError, ProcessResult};

/// Lifecycle state of the supervised slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    Running,
    Stopping,
    Stopped,
    CrashedUnexpectedly,
}

/// Owns the one managed child.
#[derive(Debug)]
pub struct ProcessSupervisor {
    launch: LaunchSpec,
    stop_timeout: Duration,
    current: Option<ManagedProcess>,
    state: ProcessState,
}

impl ProcessSupervisor {
    pub fn new(launch: LaunchSpec, stop_timeout: Duration) -> Self {
        Self {
            launch,
            stop_timeout,
            current: None,
            state: ProcessState::NotStarted,
        }
    }

    pub fn from_config(config: &ProcessConfig) -> Self {
        Self::new(LaunchSpec::from_config(config), config.stop_timeout)
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Whether a child was ever launched.
    pub fn has_started(&self) -> bool {
        self.state != ProcessState::NotStarted
    }

    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().map(ManagedProcess::pid)
    }

    pub fn is_alive(&self) -> bool {
        self.current.as_ref().is_some_and(ManagedProcess::is_alive)
    }

    /// Launch a new child.
    pub fn start(&mut self) -> ProcessResult<u32> {
        if let Some(current) = self.current.as_ref().filter(|p| p.is_alive()) {
            return Err(ProcessError::AlreadyRunning { pid: current.pid() });
        }

        let process = ManagedProcess::spawn(&self.launch)?;
        let pid = process.pid();
        self.current = Some(process);
        self.state = ProcessState::Running;

        metrics::record_process_start();
        metrics::set_process_running(true);
        tracing::info!(pid, "Process started");
        Ok(pid)
    }

    /// Gracefully stop the current child, if any.
    ///
    /// Blocks until the child has been reaped. On error the child stays
    /// in the slot so it is killed when the supervisor is dropped.
    pub async fn stop(&mut self) -> ProcessResult<Option<ProcessExit>> {
        let Some(process) = self.current.as_ref() else {
            return Ok(None);
        };

        self.state = ProcessState::Stopping;
        let pid = process.pid();
        let outcome = process.stop(self.stop_timeout).await?;

        if outcome.forced {
            metrics::record_forced_kill();
        }
        metrics::set_process_running(false);
        tracing::info!(pid, exit = %outcome.exit, forced = outcome.forced, "Process quit");

        self.current = None;
        self.state = ProcessState::Stopped;
        Ok(Some(outcome.exit))
    }

    /// Stop the current child completely, then launch a fresh one.
    ///
    /// A child that already exited on its own is reported as
    /// [`ProcessError::UnexpectedExit`] instead of being replaced.
    pub async fn restart(&mut self) -> ProcessResult<u32> {
        self.check_liveness()?;
        self.stop().await?;
        self.start()
    }

    /// Report a child that exited while it was supposed to be running.
    pub fn check_liveness(&mut self) -> ProcessResult<()> {
        if self.state != ProcessState::Running {
            return Ok(());
        }

        let Some(process) = self.current.as_ref() else {
            return Ok(());
        };

        match process.exit() {
            None => Ok(()),
            Some(exit) => {
                let pid = process.pid();
                self.state = ProcessState::CrashedUnexpectedly;
                metrics::set_process_running(false);
                Err(ProcessError::UnexpectedExit { pid, exit })
            }
        }
    }
}
