//! Filesystem adapter over JSON table snapshots
//!
//! A snapshot is the JSON export of a PHA file made by an external FITS
//! reader: `{"extensions": {"SPECTRUM": {"header": {..}, "columns": {..}}}}`.
//! Response snapshots carry the energy bounds only: `{"ebounds": [..]}`.

use super::memory::{EnergyBounds, MemoryFile};
use super::table::{PhaTable, Response, ResponseLoader, TableReader};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Read a file to a string, mapping a missing file to [`Error::FileNotFound`]
fn read_snapshot_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::file_not_found(path.display().to_string())
        } else {
            Error::io(format!("Failed to read snapshot {}", path.display()), e)
        }
    })
}

/// Load a PHA table snapshot from disk
pub fn load_table_snapshot(path: &Path) -> Result<MemoryFile> {
    let content = read_snapshot_text(path)?;
    let file: MemoryFile = serde_json::from_str(&content).map_err(|e| {
        Error::snapshot(
            path.display().to_string(),
            "invalid table snapshot",
            e,
        )
    })?;

    debug!(
        "Loaded table snapshot {} with {} extension(s)",
        path.display(),
        file.extensions.len()
    );
    Ok(file)
}

/// Load a response snapshot from disk
pub fn load_response_snapshot(path: &Path) -> Result<EnergyBounds> {
    let content = read_snapshot_text(path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::snapshot(
            path.display().to_string(),
            "invalid response snapshot",
            e,
        )
    })
}

/// Join relative references onto a base directory
fn resolve_against(base_dir: Option<&Path>, reference: &Path) -> PathBuf {
    match base_dir {
        Some(base) if reference.is_relative() => base.join(reference),
        _ => reference.to_path_buf(),
    }
}

/// Table reader that loads one snapshot file per open
///
/// Relative paths (including BACKFILE references) resolve against the base
/// directory when one is set.
#[derive(Debug, Clone, Default)]
pub struct JsonTableReader {
    base_dir: Option<PathBuf>,
}

impl JsonTableReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

impl TableReader for JsonTableReader {
    fn open_extension(&self, path: &Path, extension: &str) -> Result<Option<Box<dyn PhaTable>>> {
        let path = resolve_against(self.base_dir.as_deref(), path);
        let mut file = load_table_snapshot(&path)?;
        Ok(file
            .extensions
            .remove(extension)
            .map(|table| Box::new(table) as Box<dyn PhaTable>))
    }
}

/// Response loader resolving references against a base directory
#[derive(Debug, Clone, Default)]
pub struct JsonResponseLoader {
    base_dir: Option<PathBuf>,
}

impl JsonResponseLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative references against `base_dir`
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

impl ResponseLoader for JsonResponseLoader {
    fn load(&self, reference: &str) -> Result<Arc<dyn Response>> {
        let path = resolve_against(self.base_dir.as_deref(), Path::new(reference.trim()));
        let bounds = load_response_snapshot(&path)?;
        Ok(Arc::new(bounds))
    }
}
