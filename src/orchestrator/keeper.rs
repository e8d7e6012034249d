//! The keeper control loop.

use std::io::Write;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::schema::MAX_DURATION;
use crate::config::KeeperSettings;
use crate::observability::metrics;
use crate::process::{ProcessError, ProcessSupervisor};
use crate::render::ConfigRenderer;
use crate::watch::{reload_channel, ChangeDetector, SwapPredicate, SymlinkSwapMarker};

/// Fatal errors that end the control loop.
#[derive(Debug, Error)]
pub enum KeeperError {
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Keeps one child process running on the latest rendered configuration.
pub struct Keeper {
    settings: Arc<KeeperSettings>,
    renderer: ConfigRenderer,
    supervisor: ProcessSupervisor,
    predicate: Arc<dyn SwapPredicate>,
}

impl Keeper {
    pub fn new(settings: Arc<KeeperSettings>) -> Self {
        let renderer = ConfigRenderer::new(&settings.source);
        let supervisor = ProcessSupervisor::from_config(&settings.process);
        let predicate: Arc<dyn SwapPredicate> =
            Arc::new(SymlinkSwapMarker::new(settings.source.swap_marker.clone()));

        Self {
            settings,
            renderer,
            supervisor,
            predicate,
        }
    }

    /// Replace the rule that recognizes a completed atomic update.
    pub fn with_swap_predicate(mut self, predicate: Arc<dyn SwapPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    /// Run until shutdown or a fatal process error.
    ///
    /// Shutdown, reload requests and liveness ticks are handled strictly
    /// one at a time. Shutdown wins when several are ready at once.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), KeeperError> {
        let (reload_tx, mut reload_rx) = reload_channel();
        let _detector = ChangeDetector::new(
            self.settings.source.path.clone(),
            Arc::clone(&self.predicate),
            self.settings.source.poll_interval,
            reload_tx.clone(),
        )
        .start();

        if self.apply_change() {
            reload_tx.request();
        } else {
            tracing::info!("Process will not start until the source config is updated");
        }

        let period = self.settings.health_check.interval.min(MAX_DURATION);
        let mut liveness = time::interval_at(Instant::now() + period, period);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    return self.shutdown().await;
                }
                Some(()) = reload_rx.recv() => {
                    self.handle_reload().await?;
                }
                _ = liveness.tick() => {
                    self.supervisor.check_liveness()?;
                }
            }
        }
    }

    async fn handle_reload(&mut self) -> Result<(), KeeperError> {
        tracing::info!("Reload");
        metrics::record_reload();

        // A bad edit must not take down a healthy child.
        if !self.apply_change() {
            return Ok(());
        }

        if self.supervisor.has_started() {
            self.supervisor.restart().await?;
        } else {
            self.supervisor.start()?;
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), KeeperError> {
        if self.supervisor.pid().is_some() {
            tracing::info!("Waiting for process shutdown");
        }
        self.supervisor.stop().await?;
        tracing::info!("Keeper stopped");
        Ok(())
    }

    fn apply_change(&self) -> bool {
        match self.renderer.apply() {
            Ok(rendered) => {
                if self.settings.observability.echo_rendered {
                    let mut stdout = std::io::stdout().lock();
                    let _ = stdout.write_all(&rendered);
                    let _ = stdout.flush();
                }
                true
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Error applying change");
                metrics::record_render_failure(e.kind());
                false
            }
        }
    }
}
