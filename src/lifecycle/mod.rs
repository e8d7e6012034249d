//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Init logging → Load settings → Start metrics exporter
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown.rs broadcast
//!
//! Shutdown (shutdown.rs):
//!     Broadcast received by the control loop → stop child → exit 0
//! ```
//!
//! # Design Decisions
//! - Bad settings degrade to defaults; only an unreadable settings file
//!   named explicitly is fatal at startup
//! - Shutdown waits for the child's stop protocol to finish

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
