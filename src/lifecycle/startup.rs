//! Startup orchestration.
//!
//! Order: logging first (so settings warnings are visible), then
//! settings, then the optional metrics exporter. The environment is read
//! here and nowhere else.

use std::path::Path;
use std::sync::Arc;

use crate::config::{load_settings, ConfigError, KeeperSettings, LogFormat};
use crate::observability::{logging, metrics};

/// Environment variable selecting the log format.
pub const ENV_LOG_FORMAT: &str = "KEEPER_LOG_FORMAT";

/// Install logging using `KEEPER_LOG_FORMAT` (pretty when unset or unknown).
pub fn init_logging() {
    let raw = std::env::var(ENV_LOG_FORMAT).ok();
    let format = raw.as_deref().and_then(LogFormat::parse);
    logging::init_logging(format.unwrap_or_default());

    if let (Some(raw), None) = (raw.as_deref(), format) {
        tracing::warn!(var = ENV_LOG_FORMAT, value = %raw, "Unknown log format, using pretty");
    }
}

/// Load settings from the optional file and the process environment,
/// then start the metrics exporter if enabled.
pub fn bootstrap(
    settings_path: Option<&Path>,
    child_args: Vec<String>,
) -> Result<Arc<KeeperSettings>, ConfigError> {
    let settings = load_settings(settings_path, child_args, |key| std::env::var(key).ok())?;

    tracing::info!(
        executable = %settings.process.executable,
        args = ?settings.process.args,
        source = %settings.source.path.display(),
        template = %settings.source.template_path.display(),
        destination = %settings.source.destination_path.display(),
        liveness_period = ?settings.health_check.interval,
        poll_interval = ?settings.source.poll_interval,
        stop_timeout = ?settings.process.stop_timeout,
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    Ok(Arc::new(settings))
}
