//! Application constants for the OGIP PHA decoder
//!
//! This module contains keyword names, column names, quality codes and
//! default values used throughout the decoder.

// =============================================================================
// Extension and Token Names
// =============================================================================

/// Name of the binary table extension holding PHA data
pub const SPECTRUM_EXTENSION: &str = "SPECTRUM";

/// Literal token meaning "no value" in keyword cards and keyword columns
pub const NONE_TOKEN: &str = "NONE";

/// Name reported for a telescope or instrument that was not recorded
pub const UNKNOWN_NAME: &str = "UNKNOWN";

// =============================================================================
// OGIP Keywords
// =============================================================================

/// Header keywords read from the SPECTRUM extension
pub mod keywords {
    pub const TELESCOP: &str = "TELESCOP";
    pub const INSTRUME: &str = "INSTRUME";
    pub const FILTER: &str = "FILTER";
    pub const EXPOSURE: &str = "EXPOSURE";
    pub const BACKFILE: &str = "BACKFILE";
    pub const RESPFILE: &str = "RESPFILE";
    pub const ANCRFILE: &str = "ANCRFILE";
    pub const HDUCLASS: &str = "HDUCLASS";
    pub const HDUCLAS1: &str = "HDUCLAS1";
    pub const POISSERR: &str = "POISSERR";
    pub const CHANTYPE: &str = "CHANTYPE";
    pub const DETCHANS: &str = "DETCHANS";
    pub const BACKSCAL: &str = "BACKSCAL";

    /// Correction file; decoding rejects any value other than NONE
    pub const CORRFILE: &str = "CORRFILE";
    pub const CORRSCAL: &str = "CORRSCAL";

    /// Scalar quality card; 0 declares every channel good
    pub const QUALITY: &str = "QUALITY";

    /// Keywords that a Type II file may override per row, observed spectra
    pub const OBSERVED_COLUMN_OVERRIDES: &[&str] = &[
        EXPOSURE, BACKFILE, CORRFILE, CORRSCAL, RESPFILE, ANCRFILE, BACKSCAL,
    ];

    /// Keywords that a Type II file may override per row, background spectra
    pub const BACKGROUND_COLUMN_OVERRIDES: &[&str] = &[EXPOSURE, BACKSCAL];
}

// =============================================================================
// Data Columns
// =============================================================================

/// Column names of the SPECTRUM extension
pub mod columns {
    pub const COUNTS: &str = "COUNTS";
    pub const RATE: &str = "RATE";
    pub const STAT_ERR: &str = "STAT_ERR";
    pub const SYS_ERR: &str = "SYS_ERR";
    pub const QUALITY: &str = "QUALITY";
}

// =============================================================================
// Quality Control Constants
// =============================================================================

/// OGIP quality codes with a dedicated meaning
pub mod quality_codes {
    /// Good channel
    pub const GOOD: i64 = 0;

    /// Channel flagged as dubious by the instrument team
    pub const WARN: i64 = 2;

    /// Code substituted for every channel when the QUALITY card is non-zero
    pub const ALL_BAD: i64 = 5;
}

/// Check whether a text value is the NONE token (any case, blanks ignored)
pub fn is_none_token(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(NONE_TOKEN)
}
