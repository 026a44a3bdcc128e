//! In-memory table and response collaborators
//!
//! Holds already-decoded PHA extensions and responses keyed by path. Also the
//! document model for JSON table snapshots read by the filesystem adapter.

use super::table::{Column, PhaTable, Response, ResponseLoader, TableReader, Value};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One table extension: header cards plus named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryTable {
    #[serde(default)]
    pub header: BTreeMap<String, Value>,

    #[serde(default)]
    pub columns: BTreeMap<String, Column>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a header card
    pub fn with_header(mut self, keyword: impl Into<String>, value: impl Into<Value>) -> Self {
        self.header.insert(keyword.into(), value.into());
        self
    }

    /// Add or replace a column
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    /// Remove a header card
    pub fn without_header(mut self, keyword: &str) -> Self {
        self.header.remove(keyword);
        self
    }

    /// Remove a column
    pub fn without_column(mut self, name: &str) -> Self {
        self.columns.remove(name);
        self
    }
}

impl PhaTable for MemoryTable {
    fn header(&self, keyword: &str) -> Option<&Value> {
        self.header.get(keyword)
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }
}

/// A whole file: extensions by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFile {
    #[serde(default)]
    pub extensions: BTreeMap<String, MemoryTable>,
}

impl MemoryFile {
    /// File with a single extension
    pub fn with_extension(name: impl Into<String>, table: MemoryTable) -> Self {
        let mut extensions = BTreeMap::new();
        extensions.insert(name.into(), table);
        Self { extensions }
    }
}

/// Table reader over files held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, MemoryFile>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under `path`
    pub fn insert(&mut self, path: impl Into<PathBuf>, file: MemoryFile) {
        self.files.insert(path.into(), file);
    }

    /// Builder form of [`MemoryReader::insert`]
    pub fn with_file(mut self, path: impl Into<PathBuf>, file: MemoryFile) -> Self {
        self.insert(path, file);
        self
    }
}

impl TableReader for MemoryReader {
    fn open_extension(&self, path: &Path, extension: &str) -> Result<Option<Box<dyn PhaTable>>> {
        let file = self
            .files
            .get(path)
            .ok_or_else(|| Error::file_not_found(path.display().to_string()))?;

        Ok(file
            .extensions
            .get(extension)
            .map(|table| Box::new(table.clone()) as Box<dyn PhaTable>))
    }
}

/// Response holding nothing but its energy bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyBounds {
    pub ebounds: Vec<f64>,
}

impl EnergyBounds {
    pub fn new(ebounds: Vec<f64>) -> Self {
        Self { ebounds }
    }
}

impl Response for EnergyBounds {
    fn ebounds(&self) -> &[f64] {
        &self.ebounds
    }
}

/// Response loader over responses held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryResponses {
    responses: HashMap<String, Arc<dyn Response>>,
}

impl MemoryResponses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response under its RESPFILE reference
    pub fn insert(&mut self, reference: impl Into<String>, response: Arc<dyn Response>) {
        self.responses.insert(reference.into(), response);
    }

    /// Builder form registering plain energy bounds
    pub fn with_ebounds(mut self, reference: impl Into<String>, ebounds: Vec<f64>) -> Self {
        self.insert(reference, Arc::new(EnergyBounds::new(ebounds)));
        self
    }
}

impl ResponseLoader for MemoryResponses {
    fn load(&self, reference: &str) -> Result<Arc<dyn Response>> {
        self.responses
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::file_not_found(reference))
    }
}
