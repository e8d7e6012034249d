//! OS signal handling.
//!
//! SIGTERM (sent by the orchestrator on pod deletion) and SIGINT both
//! trigger a graceful shutdown. A stop already in progress is never
//! interrupted; the control loop sees the shutdown on its next turn.

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Register handlers and forward the first termination signal to
/// `shutdown`.
///
/// Handlers are installed before this returns, so registration errors
/// surface at startup rather than being lost in a background task.
pub fn install(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = terminate.recv() => "SIGTERM",
            _ = interrupt.recv() => "SIGINT",
        };
        tracing::info!(signal = name, "Shutdown signal received");
        if !shutdown.trigger() {
            tracing::warn!("Shutdown requested but the control loop is gone");
        }
    }))
}
