//! Reading render inputs and persisting the rendered file.

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::SourceConfig;
use crate::render::engine::render;
use crate::render::error::{RenderError, RenderResult};

const RENDERED_FILE_MODE: u32 = 0o644;

/// Derives the destination file from the current source and template.
#[derive(Debug, Clone)]
pub struct ConfigRenderer {
    source_path: PathBuf,
    template_path: PathBuf,
    destination_path: PathBuf,
}

impl ConfigRenderer {
    pub fn new(source: &SourceConfig) -> Self {
        Self {
            source_path: source.path.clone(),
            template_path: source.template_path.clone(),
            destination_path: source.destination_path.clone(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination_path
    }

    /// Re-read both inputs, render, and replace the destination file.
    ///
    /// On any error the previous destination file is left untouched.
    pub fn apply(&self) -> RenderResult<Vec<u8>> {
        let source = read(&self.source_path)?;
        let template = read(&self.template_path)?;
        let rendered = render(&source, &template)?;

        write_atomic(&self.destination_path, &rendered).map_err(|source| RenderError::Write {
            path: self.destination_path.clone(),
            source,
        })?;

        tracing::info!(
            destination = %self.destination_path.display(),
            bytes = rendered.len(),
            "Rendered configuration written"
        );
        Ok(rendered)
    }
}

fn read(path: &Path) -> RenderResult<Vec<u8>> {
    fs::read(path).map_err(|source| RenderError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with `contents` so readers see either the old file or
/// the complete new one.
///
/// The data goes to a temporary file in the same directory, is synced,
/// then renamed over the destination.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(RENDERED_FILE_MODE))?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
