//! Settings schema definitions.
//!
//! This module defines the complete settings structure for the keeper.
//! All types derive Serde traits so they can be read from an optional
//! TOML file before environment overrides are applied.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default liveness probe period.
pub const DEFAULT_LIVENESS_PERIOD: Duration = Duration::from_secs(10);

/// Default fingerprint poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default grace period between SIGTERM and SIGKILL.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest accepted period or timeout. Larger values overflow timer deadlines.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Root settings for the keeper.
///
/// Constructed once at startup and shared read-only with every component.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct KeeperSettings {
    /// Managed child process.
    pub process: ProcessConfig,

    /// Source document, template and rendered destination.
    pub source: SourceConfig,

    /// Liveness probing of the child.
    pub health_check: HealthCheckConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Child process launch configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProcessConfig {
    /// Executable to launch (resolved through `PATH` when not absolute).
    pub executable: String,

    /// Arguments passed to the executable.
    pub args: Vec<String>,

    /// How long a graceful stop waits before escalating to SIGKILL.
    #[serde(rename = "stop_timeout_secs", with = "duration_secs")]
    pub stop_timeout: Duration,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            executable: "filebeat".to_string(),
            args: Vec::new(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// Where the source document lives and where the rendered file goes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Externally managed source document (YAML).
    pub path: PathBuf,

    /// Template rendered against the source document.
    pub template_path: PathBuf,

    /// Rendered output consumed by the child.
    pub destination_path: PathBuf,

    /// File name of the entry that is swapped last during an atomic
    /// volume update (`..data` for Kubernetes ConfigMap mounts).
    pub swap_marker: String,

    /// Period of the fallback fingerprint poll.
    #[serde(rename = "poll_interval_secs", with = "duration_secs")]
    pub poll_interval: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/config/filebeat-output.yml"),
            template_path: PathBuf::from("/etc/filebeat/filebeat.yml.tpl"),
            destination_path: PathBuf::from("/etc/filebeat/filebeat.yml"),
            swap_marker: "..data".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Liveness check configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Liveness check interval.
    #[serde(rename = "interval_secs", with = "duration_secs")]
    pub interval: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_LIVENESS_PERIOD,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, for terminals.
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

impl LogFormat {
    /// Parse a format name, returning `None` for unknown names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Print every freshly rendered file to stdout.
    pub echo_rendered: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            echo_rendered: true,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Serde adapter storing a `Duration` as (possibly fractional) seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
