//! Test utilities and fixtures for PHA decoder testing
//!
//! This module provides in-memory PHA tables shaped like real OGIP files and
//! helpers to register them with a reader.

use crate::app::adapters::memory::{MemoryFile, MemoryReader, MemoryResponses, MemoryTable};
use crate::app::adapters::table::{Column, Value};

mod keyword_tests;

/// Energy bounds of the four-channel test response
pub const EBOUNDS: [f64; 5] = [8.0, 16.0, 32.0, 64.0, 128.0];

/// Reference of the test response
pub const RESPONSE_FILE: &str = "det.rsp";

/// Header of a compliant observed Type I file without a background
pub fn observed_header() -> MemoryTable {
    MemoryTable::new()
        .with_header("TELESCOP", "GLAST")
        .with_header("INSTRUME", "GBM")
        .with_header("FILTER", "NONE")
        .with_header("EXPOSURE", 10.0)
        .with_header("BACKFILE", "NONE")
        .with_header("RESPFILE", RESPONSE_FILE)
        .with_header("ANCRFILE", "none")
        .with_header("HDUCLASS", "OGIP")
        .with_header("HDUCLAS1", "SPECTRUM")
        .with_header("POISSERR", true)
        .with_header("CHANTYPE", "PHA")
        .with_header("DETCHANS", 4_i64)
        .with_header("BACKSCAL", 1.0)
}

/// Observed Type I file storing counts
pub fn type_i_counts_table() -> MemoryTable {
    observed_header()
        .with_column("CHANNEL", Column::integers([1, 2, 3, 4]))
        .with_column("COUNTS", Column::numeric([10.0, 20.0, 30.0, 40.0]))
        .with_column("QUALITY", Column::integers([0, 2, 5, 0]))
}

/// Observed Type I file storing the same spectrum as rates
pub fn type_i_rate_table() -> MemoryTable {
    observed_header()
        .with_column("CHANNEL", Column::integers([1, 2, 3, 4]))
        .with_column("RATE", Column::numeric([1.0, 2.0, 3.0, 4.0]))
        .with_column("QUALITY", Column::integers([0, 2, 5, 0]))
}

/// Non-Poisson background Type I file
pub fn background_table() -> MemoryTable {
    MemoryTable::new()
        .with_header("TELESCOP", "GLAST")
        .with_header("INSTRUME", "GBM")
        .with_header("FILTER", "NONE")
        .with_header("EXPOSURE", 20.0)
        .with_header("ANCRFILE", "NONE")
        .with_header("HDUCLASS", "OGIP")
        .with_header("HDUCLAS1", "SPECTRUM")
        .with_header("POISSERR", false)
        .with_header("CHANTYPE", "PHA")
        .with_header("DETCHANS", 4_i64)
        .with_header("BACKSCAL", 2.0)
        .with_header("QUALITY", 0_i64)
        .with_column("COUNTS", Column::numeric([2.0, 4.0, 6.0, 8.0]))
        .with_column("STAT_ERR", Column::numeric([1.0, 2.0, 2.0, 3.0]))
}

/// Observed Type II file with three spectra of four channels
///
/// EXPOSURE is stored per row and overrides the header card.
pub fn type_ii_table() -> MemoryTable {
    observed_header()
        .with_header("EXPOSURE", 1.0)
        .with_column("SPEC_NUM", Column::integers([1, 2, 3]))
        .with_column(
            "COUNTS",
            Column::Array(vec![
                vec![10.0, 20.0, 30.0, 40.0],
                vec![5.0, 15.0, 25.0, 35.0],
                vec![1.0, 1.0, 1.0, 1.0],
            ]),
        )
        .with_column("EXPOSURE", Column::numeric([10.0, 5.0, 2.0]))
        .with_column(
            "QUALITY",
            Column::Array(vec![
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 2.0, 2.0, 1.0],
                vec![5.0, 5.0, 5.0, 5.0],
            ]),
        )
}

/// Background Type II file matching [`type_ii_table`] row by row
pub fn type_ii_background_table() -> MemoryTable {
    background_table()
        .without_column("COUNTS")
        .without_column("STAT_ERR")
        .with_header("POISSERR", true)
        .with_column(
            "COUNTS",
            Column::Array(vec![
                vec![1.0, 1.0, 1.0, 1.0],
                vec![2.0, 2.0, 2.0, 2.0],
                vec![3.0, 3.0, 3.0, 3.0],
            ]),
        )
        .with_column("EXPOSURE", Column::numeric([100.0, 200.0, 300.0]))
}

/// Reader holding each table as the SPECTRUM extension of its path
pub fn reader_with(files: Vec<(&str, MemoryTable)>) -> MemoryReader {
    let mut reader = MemoryReader::new();
    for (path, table) in files {
        reader.insert(path, MemoryFile::with_extension("SPECTRUM", table));
    }
    reader
}

/// Response loader knowing the test response
pub fn responses() -> MemoryResponses {
    MemoryResponses::new().with_ebounds(RESPONSE_FILE, EBOUNDS.to_vec())
}

/// Text value helper
pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}
