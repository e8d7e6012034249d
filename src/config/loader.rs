//! Settings loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::{
    KeeperSettings, DEFAULT_LIVENESS_PERIOD, DEFAULT_POLL_INTERVAL, DEFAULT_STOP_TIMEOUT,
    MAX_DURATION,
};
use crate::config::validation::sanitize;

pub const ENV_EXE_PATH: &str = "KEEPER_EXE_PATH";
pub const ENV_SRC_CONFIG_PATH: &str = "KEEPER_SRC_CONFIG_PATH";
pub const ENV_DST_CONFIG_PATH: &str = "KEEPER_DST_CONFIG_PATH";
pub const ENV_TEMPLATE_PATH: &str = "KEEPER_TEMPLATE_PATH";
pub const ENV_SWAP_MARKER: &str = "KEEPER_SWAP_MARKER";
pub const ENV_LIVENESS_PERIOD: &str = "KEEPER_LIVENESS_PROBE_PERIOD_SECONDS";
pub const ENV_POLL_INTERVAL: &str = "KEEPER_POLL_INTERVAL_SECONDS";
pub const ENV_STOP_TIMEOUT: &str = "KEEPER_STOP_TIMEOUT_SECONDS";
pub const ENV_ECHO_RENDERED: &str = "KEEPER_ECHO_RENDERED";
pub const ENV_METRICS_ADDRESS: &str = "KEEPER_METRICS_ADDRESS";

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load settings from an optional TOML file, then layer environment
/// overrides and the child's command-line arguments on top.
///
/// `lookup` resolves environment variable names; pass
/// `|key| std::env::var(key).ok()` for the real environment.
pub fn load_settings<F>(
    path: Option<&Path>,
    child_args: Vec<String>,
    lookup: F,
) -> Result<KeeperSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match path {
        Some(path) => load_file(path)?,
        None => KeeperSettings::default(),
    };

    apply_env(&mut settings, lookup);

    if !child_args.is_empty() {
        settings.process.args = child_args;
    }

    for problem in sanitize(&mut settings) {
        tracing::warn!("Invalid setting: {}", problem);
    }

    Ok(settings)
}

/// Parse a settings file.
pub fn load_file(path: &Path) -> Result<KeeperSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply environment overrides. Unset or empty variables are ignored;
/// unparsable ones are logged and replaced by the built-in default.
pub fn apply_env<F>(settings: &mut KeeperSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(exe) = lookup(ENV_EXE_PATH) {
        settings.process.executable = exe;
    }
    if let Some(path) = lookup(ENV_SRC_CONFIG_PATH) {
        settings.source.path = PathBuf::from(path);
    }
    if let Some(path) = lookup(ENV_DST_CONFIG_PATH) {
        settings.source.destination_path = PathBuf::from(path);
    }
    if let Some(path) = lookup(ENV_TEMPLATE_PATH) {
        settings.source.template_path = PathBuf::from(path);
    }
    if let Some(marker) = lookup(ENV_SWAP_MARKER) {
        settings.source.swap_marker = marker;
    }

    if let Some(raw) = lookup(ENV_LIVENESS_PERIOD) {
        settings.health_check.interval = secs_or_default(ENV_LIVENESS_PERIOD, &raw, DEFAULT_LIVENESS_PERIOD);
    }
    if let Some(raw) = lookup(ENV_POLL_INTERVAL) {
        settings.source.poll_interval = secs_or_default(ENV_POLL_INTERVAL, &raw, DEFAULT_POLL_INTERVAL);
    }
    if let Some(raw) = lookup(ENV_STOP_TIMEOUT) {
        settings.process.stop_timeout = secs_or_default(ENV_STOP_TIMEOUT, &raw, DEFAULT_STOP_TIMEOUT);
    }

    if let Some(raw) = lookup(ENV_ECHO_RENDERED) {
        match parse_bool(&raw) {
            Some(echo) => settings.observability.echo_rendered = echo,
            None => {
                tracing::warn!(var = ENV_ECHO_RENDERED, value = %raw, "Invalid boolean, using default true");
                settings.observability.echo_rendered = true;
            }
        }
    }
    if let Some(address) = lookup(ENV_METRICS_ADDRESS) {
        settings.observability.metrics_enabled = true;
        settings.observability.metrics_address = address;
    }
}

/// Parse a positive number of seconds (integer or fractional), at most
/// [`MAX_DURATION`].
pub fn parse_secs(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().parse().ok()?;
    if secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| *d <= MAX_DURATION)
}

fn secs_or_default(var: &str, raw: &str, default: Duration) -> Duration {
    parse_secs(raw).unwrap_or_else(|| {
        tracing::warn!(var, value = %raw, default = ?default, "Invalid duration, using default");
        default
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
