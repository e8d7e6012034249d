//! Source change detection.
//!
//! # Data Flow
//! ```text
//! inotify/kqueue events on the source directory
//!     → swap.rs (keep only the terminal swap event)
//!     → fingerprint.rs (compare under lock) ─┐
//!                                            ├─→ reload slot (capacity 1, try_send)
//! periodic poll                              │       → orchestrator
//!     → fingerprint.rs (compare under lock) ─┘
//! ```
//!
//! # Design Decisions
//! - Either path alone is enough to detect a change
//! - Duplicate requests are dropped, not queued; a pending reload
//!   always re-reads the latest content
//! - An unreadable source is a warning, never a reload

pub mod detector;
pub mod fingerprint;
pub mod swap;

pub use detector::{reload_channel, ChangeDetector, DetectorHandle, ReloadReceiver, ReloadSender};
pub use fingerprint::{Change, Fingerprint, FingerprintTracker};
pub use swap::{SwapPredicate, SymlinkSwapMarker};
