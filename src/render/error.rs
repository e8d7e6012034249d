//! Configuration derivation errors.
//!
//! Every variant is recoverable: the keeper logs it, keeps the previous
//! rendered file and the running child, and retries on the next signal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while deriving the rendered configuration.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An input file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The source document is not a well-formed YAML mapping.
    #[error("error decoding source config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The template is not UTF-8 text.
    #[error("template is not valid UTF-8: {0}")]
    TemplateEncoding(#[from] std::str::Utf8Error),

    /// The template has invalid syntax.
    #[error("invalid template: {0}")]
    Template(#[source] minijinja::Error),

    /// The template references a missing or incompatible field.
    #[error("error rendering template: {0}")]
    Render(#[source] minijinja::Error),

    /// The rendered output could not be persisted.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RenderError {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::Read { .. } => "read",
            RenderError::Parse(_) => "parse",
            RenderError::TemplateEncoding(_) | RenderError::Template(_) => "template",
            RenderError::Render(_) => "render",
            RenderError::Write { .. } => "write",
        }
    }
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
