//! Settings validation.
//!
//! Invalid values never abort startup: each one is replaced by its
//! default and reported so the caller can log it. All problems are
//! returned, not just the first.

use std::time::Duration;

use thiserror::Error;

use crate::config::schema::{
    KeeperSettings, ProcessConfig, SourceConfig, DEFAULT_LIVENESS_PERIOD, DEFAULT_POLL_INTERVAL,
    DEFAULT_STOP_TIMEOUT, MAX_DURATION,
};

/// A settings value that was rejected and replaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero, using default {default:?}")]
    ZeroDuration {
        field: &'static str,
        default: Duration,
    },

    #[error("{field} must be at most {max:?}, using default {default:?}")]
    TooLong {
        field: &'static str,
        max: Duration,
        default: Duration,
    },

    #[error("{field} must not be empty, using default {default:?}")]
    Empty {
        field: &'static str,
        default: String,
    },
}

/// Replace out-of-range values in place with their defaults.
pub fn sanitize(settings: &mut KeeperSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    in_range(
        &mut settings.health_check.interval,
        "health_check.interval_secs",
        DEFAULT_LIVENESS_PERIOD,
        &mut errors,
    );
    in_range(
        &mut settings.source.poll_interval,
        "source.poll_interval_secs",
        DEFAULT_POLL_INTERVAL,
        &mut errors,
    );
    in_range(
        &mut settings.process.stop_timeout,
        "process.stop_timeout_secs",
        DEFAULT_STOP_TIMEOUT,
        &mut errors,
    );

    if settings.process.executable.trim().is_empty() {
        let default = ProcessConfig::default().executable;
        errors.push(ValidationError::Empty {
            field: "process.executable",
            default: default.clone(),
        });
        settings.process.executable = default;
    }

    if settings.source.swap_marker.trim().is_empty() {
        let default = SourceConfig::default().swap_marker;
        errors.push(ValidationError::Empty {
            field: "source.swap_marker",
            default: default.clone(),
        });
        settings.source.swap_marker = default;
    }

    let defaults = SourceConfig::default();
    for (field, value, default) in [
        ("source.path", &mut settings.source.path, defaults.path),
        (
            "source.template_path",
            &mut settings.source.template_path,
            defaults.template_path,
        ),
        (
            "source.destination_path",
            &mut settings.source.destination_path,
            defaults.destination_path,
        ),
    ] {
        if value.as_os_str().is_empty() {
            errors.push(ValidationError::Empty {
                field,
                default: default.display().to_string(),
            });
            *value = default;
        }
    }

    errors
}

fn in_range(
    value: &mut Duration,
    field: &'static str,
    default: Duration,
    errors: &mut Vec<ValidationError>,
) {
    if value.is_zero() {
        errors.push(ValidationError::ZeroDuration { field, default });
        *value = default;
    } else if *value > MAX_DURATION {
        errors.push(ValidationError::TooLong {
            field,
            max: MAX_DURATION,
            default,
        });
        *value = default;
    }
}
