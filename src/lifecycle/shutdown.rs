//! Shutdown fan-out.
//!
//! The signal task triggers; the control loop listens. `main` subscribes
//! before signal handlers are installed because earlier triggers are not
//! replayed to late subscribers.

use tokio::sync::broadcast;

/// Broadcasts a shutdown request to every subscriber.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver that yields once shutdown is requested.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Request shutdown. Returns `false` when nobody is listening.
    pub fn trigger(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.clone().subscribe();

        assert!(shutdown.trigger());

        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers_reports_it() {
        assert!(!Shutdown::new().trigger());
    }

    #[test]
    fn test_late_subscriber_misses_earlier_trigger() {
        let shutdown = Shutdown::new();
        let _early = shutdown.subscribe();
        shutdown.trigger();

        let mut late = shutdown.subscribe();
        assert!(late.try_recv().is_err());
    }
}
