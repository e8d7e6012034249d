//! Dual-path change detection feeding one coalesced reload slot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::schema::MAX_DURATION;
use crate::observability::metrics;
use crate::watch::fingerprint::FingerprintTracker;
use crate::watch::swap::SwapPredicate;

/// Receiving half of the reload slot.
pub type ReloadReceiver = mpsc::Receiver<()>;

/// Sending half of the reload slot. Cloned into every producer.
#[derive(Debug, Clone)]
pub struct ReloadSender {
    tx: mpsc::Sender<()>,
}

impl ReloadSender {
    /// Request a reload without blocking.
    ///
    /// Returns `false` when a reload is already pending; that pending
    /// reload re-reads the source, so nothing is lost.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                tracing::debug!("Reload already pending, coalescing");
                false
            }
            Err(TrySendError::Closed(())) => {
                tracing::debug!("Reload receiver closed, dropping request");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a reload slot of capacity one.
pub fn reload_channel() -> (ReloadSender, ReloadReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (ReloadSender { tx }, rx)
}

/// Watches one source file through filesystem events and periodic polls.
pub struct ChangeDetector {
    tracker: Arc<FingerprintTracker>,
    predicate: Arc<dyn SwapPredicate>,
    poll_interval: Duration,
    reload: ReloadSender,
}

/// Keeps both detection paths alive. Dropping it stops them.
pub struct DetectorHandle {
    _watcher: Option<RecommendedWatcher>,
    poller: JoinHandle<()>,
}

impl Drop for DetectorHandle {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

impl ChangeDetector {
    pub fn new(
        source: impl Into<PathBuf>,
        predicate: Arc<dyn SwapPredicate>,
        poll_interval: Duration,
        reload: ReloadSender,
    ) -> Self {
        Self {
            tracker: Arc::new(FingerprintTracker::new(source)),
            predicate,
            poll_interval,
            reload,
        }
    }

    /// Prime the fingerprint and start both paths.
    ///
    /// Must be called inside a Tokio runtime. If the event watch cannot
    /// be established the poll path still runs.
    pub fn start(self) -> DetectorHandle {
        self.tracker.prime();

        let watcher = match self.watch_events() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(
                    path = %self.tracker.path().display(),
                    error = %e,
                    "Filesystem events unavailable, relying on polling"
                );
                None
            }
        };

        let poller = tokio::spawn(poll_loop(
            Arc::clone(&self.tracker),
            self.poll_interval,
            self.reload.clone(),
        ));

        DetectorHandle {
            _watcher: watcher,
            poller,
        }
    }

    fn watch_events(&self) -> notify::Result<RecommendedWatcher> {
        let dir = watch_dir(self.tracker.path());
        let tracker = Arc::clone(&self.tracker);
        let predicate = Arc::clone(&self.predicate);
        let reload = self.reload.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if predicate.is_swap_complete(&event) {
                        tracing::debug!(paths = ?event.paths, kind = ?event.kind, "Atomic update completed");
                        detect(&tracker, &reload, "event");
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(dir = %dir.display(), "Source watcher started");
        Ok(watcher)
    }
}

/// Compare fingerprints and request a reload on change.
fn detect(tracker: &FingerprintTracker, reload: &ReloadSender, origin: &'static str) -> bool {
    let Some(change) = tracker.check() else {
        return false;
    };

    match change.previous {
        None => tracing::info!(
            origin,
            current = %change.current,
            "Source file is created"
        ),
        Some(previous) => tracing::info!(
            origin,
            old = %previous,
            new = %change.current,
            "Source file needs reload"
        ),
    }
    metrics::record_change_detected(origin);
    reload.request();
    true
}

async fn poll_loop(tracker: Arc<FingerprintTracker>, period: Duration, reload: ReloadSender) {
    let period = period.min(MAX_DURATION);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if reload.is_closed() {
            break;
        }

        let tracker = Arc::clone(&tracker);
        let reload = reload.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || detect(&tracker, &reload, "poll")).await {
            tracing::warn!(error = %e, "Fingerprint poll task failed");
        }
    }
}

fn watch_dir(source: &Path) -> PathBuf {
    match source.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::swap::SymlinkSwapMarker;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reload_slot_coalesces() {
        let (tx, mut rx) = reload_channel();

        assert!(tx.request());
        for _ in 0..10 {
            assert!(!tx.request());
        }

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert!(tx.request());
    }

    #[test]
    fn test_request_after_receiver_dropped() {
        let (tx, rx) = reload_channel();
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.request());
    }

    #[test]
    fn test_watch_dir() {
        assert_eq!(watch_dir(Path::new("/config/output.yml")), PathBuf::from("/config"));
        assert_eq!(watch_dir(Path::new("output.yml")), PathBuf::from("."));
    }

    #[test]
    fn test_detect_emits_once_per_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.yml");
        fs::write(&path, "a: 1\n").unwrap();
        let tracker = FingerprintTracker::new(&path);
        tracker.prime();
        let (tx, mut rx) = reload_channel();

        fs::write(&path, "a: 2\n").unwrap();
        assert!(detect(&tracker, &tx, "event"));
        assert!(!detect(&tracker, &tx, "poll"));

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_poll_path_detects_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.yml");
        fs::write(&path, "a: 1\n").unwrap();
        let (tx, mut rx) = reload_channel();

        // A predicate that never fires isolates the poll path.
        let never = Arc::new(|_: &Event| false);
        let _handle = ChangeDetector::new(&path, never, Duration::from_millis(50), tx).start();

        fs::write(&path, "a: 2\n").unwrap();
        let got = time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(matches!(got, Ok(Some(()))));
    }

    #[tokio::test]
    async fn test_burst_of_swaps_yields_one_pending_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.yml");
        fs::write(&path, "v: 0\n").unwrap();
        let (tx, mut rx) = reload_channel();
        let detector = ChangeDetector::new(
            &path,
            Arc::new(SymlinkSwapMarker::new("output.yml")),
            Duration::from_secs(3600),
            tx,
        );
        let tracker = Arc::clone(&detector.tracker);
        let _handle = detector.start();

        for i in 1..=5 {
            fs::write(&path, format!("v: {}\n", i)).unwrap();
        }

        let got = time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(matches!(got, Ok(Some(()))));

        // Let any straggling events settle, then drain: at most one more
        // reload can be pending, never one per write.
        time::sleep(Duration::from_millis(300)).await;
        let mut extra = 0;
        while rx.try_recv().is_ok() {
            extra += 1;
        }
        assert!(extra <= 1);
        let _ = tracker.check();
        assert_eq!(
            tracker.last(),
            Some(crate::watch::fingerprint::Fingerprint::of_bytes(b"v: 5\n"))
        );
    }
}
