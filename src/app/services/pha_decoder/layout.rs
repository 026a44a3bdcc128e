//! File reference parsing and layout dispatch
//!
//! A PHA file either holds one spectrum with one channel per row (Type I) or
//! many spectra with one spectrum per row (Type II). The shape of the COUNTS
//! or RATE column tells which, and Type II files need a 1-based row selector.

use crate::app::adapters::table::PhaTable;
use crate::constants::columns;
use crate::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// `path{n}` row selector suffix
static SELECTOR_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>.+)\{(?P<number>[^{}]*)\}$").expect("selector pattern is valid")
});

/// A file path with an optional 1-based spectrum number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub path: PathBuf,
    pub spectrum_number: Option<usize>,
}

impl FileReference {
    /// Split a `path{n}` reference; a plain path has no spectrum number
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();

        let Some(captures) = SELECTOR_SUFFIX.captures(reference) else {
            return Ok(Self {
                path: PathBuf::from(reference),
                spectrum_number: None,
            });
        };

        let number = captures["number"].trim();
        let spectrum_number = number.parse::<usize>().map_err(|_| {
            Error::format(
                reference,
                format!("invalid spectrum number '{}' in file reference", number),
            )
        })?;

        if spectrum_number == 0 {
            return Err(Error::validation(format!(
                "spectrum numbers are 1-based, got 0 in '{}'",
                reference
            )));
        }

        Ok(Self {
            path: PathBuf::from(&captures["path"]),
            spectrum_number: Some(spectrum_number),
        })
    }

    /// Parse `reference`, falling back to `selector` when it has no suffix
    ///
    /// A suffix embedded in the reference takes precedence over `selector`.
    pub fn resolve(reference: &str, selector: Option<usize>) -> Result<Self> {
        let mut file_ref = Self::parse(reference)?;
        if file_ref.spectrum_number.is_none() {
            file_ref.spectrum_number = selector;
        } else if selector.is_some() && selector != file_ref.spectrum_number {
            debug!(
                "Spectrum number {:?} embedded in '{}' overrides selector {:?}",
                file_ref.spectrum_number, reference, selector
            );
        }
        Ok(file_ref)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as displayed in errors and diagnostics
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Single-spectrum or multi-spectrum table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// One spectrum, one channel per row
    TypeI,

    /// One spectrum per row
    TypeII,
}

/// Which data column the spectrum is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueColumn {
    Counts,
    Rate,
}

impl ValueColumn {
    pub fn column_name(self) -> &'static str {
        match self {
            ValueColumn::Counts => columns::COUNTS,
            ValueColumn::Rate => columns::RATE,
        }
    }

    pub fn is_rate(self) -> bool {
        self == ValueColumn::Rate
    }
}

/// Outcome of layout dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub kind: LayoutKind,
    pub value_column: ValueColumn,

    /// 0-based selected row; `Some` only for Type II
    pub row: Option<usize>,
}

impl Layout {
    pub fn is_type_ii(&self) -> bool {
        self.kind == LayoutKind::TypeII
    }

    /// Inspect the data column and select the requested row
    pub fn dispatch(
        table: &dyn PhaTable,
        file: &str,
        spectrum_number: Option<usize>,
    ) -> Result<Self> {
        let value_column = match (
            table.has_column(columns::COUNTS),
            table.has_column(columns::RATE),
        ) {
            (true, false) => ValueColumn::Counts,
            (false, true) => ValueColumn::Rate,
            (false, false) => {
                return Err(Error::format(
                    file,
                    "This file does not contain a RATE nor a COUNTS column. This is not a valid PHA file",
                ));
            }
            (true, true) => {
                return Err(Error::format(
                    file,
                    "This file contains both a RATE and a COUNTS column; cannot tell which holds the spectrum",
                ));
            }
        };

        let column = table
            .column(value_column.column_name())
            .ok_or_else(|| Error::format(file, "data column disappeared during dispatch"))?;

        // An empty column has no rank to dispatch on
        if column.n_rows() == 0 {
            return Err(Error::format(
                file,
                format!("{} column holds no data", value_column.column_name()),
            ));
        }

        match column.rank() {
            1 => {
                if let Some(number) = spectrum_number {
                    debug!(
                        "{} is a PHA Type I file; ignoring spectrum number {}",
                        file, number
                    );
                }
                Ok(Self {
                    kind: LayoutKind::TypeI,
                    value_column,
                    row: None,
                })
            }
            _ => {
                let number = spectrum_number.ok_or_else(|| Error::missing_selector(file))?;
                let n_rows = column.n_rows();

                if number == 0 || number > n_rows {
                    return Err(Error::validation(format!(
                        "spectrum number {} is out of range for '{}', which holds {} spectra",
                        number, file, n_rows
                    )));
                }

                debug!(
                    "{} is a PHA Type II file; selected spectrum {} of {}",
                    file, number, n_rows
                );
                Ok(Self {
                    kind: LayoutKind::TypeII,
                    value_column,
                    row: Some(number - 1),
                })
            }
        }
    }
}
