//! Managed child process subsystem.
//!
//! # Data Flow
//! ```text
//! supervisor.rs (single slot, state machine)
//!     → child.rs spawn (own process group, stdio inherited)
//!     → reaper task → exit watch channel → is_alive / check_liveness
//!
//! Stop:
//!     SIGTERM to group → wait ≤ stop_timeout → SIGKILL to group → wait
//! ```
//!
//! # Design Decisions
//! - Configuration is applied only by full process replacement
//! - Stop never returns while the child is still alive
//! - A crash is reported, never silently respawned

pub mod child;
pub mod error;
pub mod supervisor;

pub use child::{LaunchSpec, ManagedProcess, ProcessExit, StopOutcome};
pub use error::{ProcessError, ProcessResult};
pub use supervisor::{ProcessState, ProcessSupervisor};
