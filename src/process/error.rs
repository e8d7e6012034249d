//! Process control errors.
//!
//! All of these are fatal to the keeper: once the child's lifecycle can
//! no longer be trusted the whole sidecar exits and is restarted by its
//! host.

use thiserror::Error;

use crate::process::child::ProcessExit;

/// Errors that can occur while controlling the managed child.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be launched.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Delivering the graceful termination signal failed.
    #[error("failed to signal process {pid}: {source}")]
    Signal { pid: u32, source: nix::Error },

    /// Delivering the forced kill failed.
    #[error("failed to kill process {pid}: {source}")]
    Kill { pid: u32, source: nix::Error },

    /// The child terminated without being asked to.
    #[error("process {pid} has unexpectedly exited: {exit}")]
    UnexpectedExit { pid: u32, exit: ProcessExit },

    /// A second child was requested while one is still alive.
    #[error("process {pid} is still running")]
    AlreadyRunning { pid: u32 },
}

/// Result type for process control operations.
pub type ProcessResult<T> = Result<T, ProcessError>;
