//! Recognizing the notification that completes an atomic update.
//!
//! A ConfigMap-style volume update produces a burst of events:
//! ```text
//! create  ..2024_01_01_00_00_00.123/     (new timestamped tree)
//! create  ..data_tmp → symlink to the new tree
//! rename  ..data_tmp → ..data            (the swap, last step)
//! remove  ..2023_12_31_.../              (old tree)
//! ```
//! Only the event naming `..data` means the new tree is fully visible.

use std::ffi::OsString;

use notify::event::ModifyKind;
use notify::{Event, EventKind};

/// Decides whether a filesystem notification signals a completed update.
pub trait SwapPredicate: Send + Sync + 'static {
    fn is_swap_complete(&self, event: &Event) -> bool;
}

impl<F> SwapPredicate for F
where
    F: Fn(&Event) -> bool + Send + Sync + 'static,
{
    fn is_swap_complete(&self, event: &Event) -> bool {
        self(event)
    }
}

/// Matches creations and renames of one well-known entry name.
#[derive(Debug, Clone)]
pub struct SymlinkSwapMarker {
    marker: OsString,
}

impl SymlinkSwapMarker {
    pub fn new(marker: impl Into<OsString>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for SymlinkSwapMarker {
    fn default() -> Self {
        Self::new("..data")
    }
}

impl SwapPredicate for SymlinkSwapMarker {
    fn is_swap_complete(&self, event: &Event) -> bool {
        let relevant_kind = match event.kind {
            EventKind::Any | EventKind::Create(_) => true,
            EventKind::Modify(ModifyKind::Metadata(_)) => false,
            EventKind::Modify(_) => true,
            EventKind::Access(_) | EventKind::Remove(_) | EventKind::Other => false,
        };

        relevant_kind
            && event
                .paths
                .iter()
                .any(|path| path.file_name() == Some(self.marker.as_os_str()))
    }
}
