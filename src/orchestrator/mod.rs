//! Orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! startup: render once → success? synthesize one reload
//!
//! loop (one event at a time, shutdown first):
//!     shutdown      → stop child (SIGTERM, timeout, SIGKILL) → Ok
//!     reload        → render → ok: first start or stop-then-start
//!                            → err: log, keep everything as is
//!     liveness tick → child exited on its own? → Err(UnexpectedExit)
//! ```
//!
//! # Design Decisions
//! - Serializing all events gives the single-child invariant without locks
//! - Configuration errors are contained; process errors end the loop
//! - A crashed child ends the keeper instead of being respawned

pub mod keeper;

pub use keeper::{Keeper, KeeperError};
