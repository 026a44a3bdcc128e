//! Table and response collaborator interfaces
//!
//! The decoder does not read FITS itself. It consumes a table reader that
//! opens a named extension and exposes header cards and named columns, and a
//! response loader that turns a RESPFILE reference into energy bounds.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// Cell Values
// =============================================================================

/// A header card value or a scalar column cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value; text is parsed after trimming
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) => None,
        }
    }

    /// Integer view of the value; floats must be integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Logical view of the value (FITS `T`/`F`, `TRUE`/`FALSE`, or 0/1)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(0) => Some(false),
            Value::Int(1) => Some(true),
            Value::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
                "T" | "TRUE" => Some(true),
                "F" | "FALSE" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "T"),
            Value::Bool(false) => write!(f, "F"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

// =============================================================================
// Columns
// =============================================================================

/// A named table column
///
/// Type I files store one channel per row, so data columns are rank 1.
/// Type II files store one spectrum per row, so data columns are rank 2 and
/// keyword columns (EXPOSURE, BACKFILE, ...) are rank 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    /// Rank 2: one fixed-length numeric vector per row
    Array(Vec<Vec<f64>>),

    /// Rank 1: one scalar cell per row
    Cells(Vec<Value>),
}

impl Column {
    /// Build a rank-1 numeric column
    pub fn numeric(values: impl IntoIterator<Item = f64>) -> Self {
        Column::Cells(values.into_iter().map(Value::Float).collect())
    }

    /// Build a rank-1 integer column
    pub fn integers(values: impl IntoIterator<Item = i64>) -> Self {
        Column::Cells(values.into_iter().map(Value::Int).collect())
    }

    /// Build a rank-1 text column
    pub fn text<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Column::Cells(values.into_iter().map(|s| Value::Text(s.into())).collect())
    }

    /// Number of dimensions of the column data
    pub fn rank(&self) -> usize {
        match self {
            Column::Array(_) => 2,
            Column::Cells(_) => 1,
        }
    }

    /// Number of table rows
    pub fn n_rows(&self) -> usize {
        match self {
            Column::Array(rows) => rows.len(),
            Column::Cells(cells) => cells.len(),
        }
    }

    /// Scalar cell at a 0-based row (rank 1 only)
    pub fn cell(&self, row: usize) -> Option<&Value> {
        match self {
            Column::Cells(cells) => cells.get(row),
            Column::Array(_) => None,
        }
    }

    /// Vector at a 0-based row (rank 2 only)
    pub fn row_vector(&self, row: usize) -> Option<&[f64]> {
        match self {
            Column::Array(rows) => rows.get(row).map(Vec::as_slice),
            Column::Cells(_) => None,
        }
    }

    /// Whole rank-1 column as numbers; `None` if any cell is not numeric
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Column::Cells(cells) => cells.iter().map(Value::as_f64).collect(),
            Column::Array(_) => None,
        }
    }
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// An opened table extension
pub trait PhaTable {
    /// Header card value by keyword
    fn header(&self, keyword: &str) -> Option<&Value>;

    /// Column by name
    fn column(&self, name: &str) -> Option<&Column>;

    fn has_header(&self, keyword: &str) -> bool {
        self.header(keyword).is_some()
    }

    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Opens files and hands out one table extension at a time
pub trait TableReader {
    /// Open `path` and return the extension called `extension`
    ///
    /// Returns `Ok(None)` when the file exists but has no such extension.
    /// The returned handle is released when dropped.
    fn open_extension(&self, path: &Path, extension: &str) -> Result<Option<Box<dyn PhaTable>>>;
}

/// Detector response, consumed only for its energy bin edges
pub trait Response: fmt::Debug + Send + Sync {
    /// Channel energy edges, length = channel count + 1
    fn ebounds(&self) -> &[f64];
}

/// Resolves a RESPFILE reference to a response
pub trait ResponseLoader {
    fn load(&self, reference: &str) -> Result<Arc<dyn Response>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Int(4).as_f64(), Some(4.0));
        assert_eq!(Value::Text(" 12.5 ".to_string()).as_f64(), Some(12.5));
        assert_eq!(Value::Bool(true).as_f64(), None);

        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(3.5).as_i64(), None);

        assert_eq!(Value::Text("T".to_string()).as_bool(), Some(true));
        assert_eq!(Value::Text("false".to_string()).as_bool(), Some(false));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::Int(7).as_bool(), None);
    }

    #[test]
    fn test_value_untagged_json() {
        let values: Vec<Value> = serde_json::from_str(r#"[true, 3, 2.5, "GBM"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Bool(true),
                Value::Int(3),
                Value::Float(2.5),
                Value::Text("GBM".to_string())
            ]
        );
    }

    #[test]
    fn test_column_shapes() {
        let type_one: Column = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(type_one.rank(), 1);
        assert_eq!(type_one.n_rows(), 3);
        assert_eq!(type_one.to_f64_vec(), Some(vec![1.0, 2.0, 3.0]));

        let type_two: Column = serde_json::from_str("[[1, 2], [3, 4]]").unwrap();
        assert_eq!(type_two.rank(), 2);
        assert_eq!(type_two.n_rows(), 2);
        assert_eq!(type_two.row_vector(1), Some(&[3.0, 4.0][..]));
        assert_eq!(type_two.cell(0), None);
    }

    #[test]
    fn test_text_column_is_not_numeric() {
        let column = Column::text(["a.pha", "b.pha"]);
        assert_eq!(column.to_f64_vec(), None);
        assert_eq!(column.cell(1), Some(&Value::Text("b.pha".to_string())));
    }
}
