//! Content fingerprints and the shared "last seen" state.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

/// SHA-256 digest of a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];

        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(Self(hasher.finalize().into()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A confirmed content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    /// `None` when the file had never been fingerprinted before.
    pub previous: Option<Fingerprint>,
    pub current: Fingerprint,
}

/// Tracks the last fingerprint of one file.
///
/// Shared by the event and poll paths. The comparison and the update
/// happen under one lock, so a given change is reported exactly once.
#[derive(Debug)]
pub struct FingerprintTracker {
    path: PathBuf,
    last: Mutex<Option<Fingerprint>>,
}

impl FingerprintTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the current fingerprint without reporting it as a change.
    pub fn prime(&self) {
        let mut last = self.lock();
        match Fingerprint::of_file(&self.path) {
            Ok(fp) => *last = Some(fp),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Source not readable yet");
            }
        }
    }

    /// Re-fingerprint the file and report whether it changed.
    ///
    /// An unreadable file is logged and never reported, and the stored
    /// fingerprint is kept.
    pub fn check(&self) -> Option<Change> {
        let mut last = self.lock();

        let current = match Fingerprint::of_file(&self.path) {
            Ok(fp) => fp,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to fingerprint source");
                return None;
            }
        };

        match *last {
            Some(previous) if previous == current => None,
            previous => {
                *last = Some(current);
                Some(Change { previous, current })
            }
        }
    }

    pub fn last(&self) -> Option<Fingerprint> {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Fingerprint>> {
        // Poisoning cannot leave a half-written Copy value behind.
        self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
