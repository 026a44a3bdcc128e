//! OGIP PHA Library
//!
//! A Rust library for decoding detector spectra stored in the OGIP PHA format
//! into a validated, typed in-memory spectrum model.
//!
//! This library provides tools for:
//! - Resolving OGIP keywords from header cards or per-row column overrides
//! - Handling both single-spectrum (Type I) and multi-spectrum (Type II) layouts
//! - Normalizing COUNTS and RATE columns to a common rate representation
//! - Reducing OGIP quality codes to good/warn/bad channel flags
//! - Decoding the background spectrum referenced by an observation
//! - Reporting non-compliant input as structured diagnostics instead of failures

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod pha_decoder;
    }
    pub mod adapters {
        pub mod filesystem;
        pub mod memory;
        pub mod table;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::diagnostics::{Diagnostic, DiagnosticKind};
pub use app::models::{ObservedLinks, Quality, QualityFlag, Spectrum, SpectrumParts, SpectrumRole};
pub use app::services::pha_decoder::{DecodeResult, PhaDecoder};
pub use config::DecoderConfig;

/// Result type alias for PHA decoding
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for PHA decoding operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Table snapshot could not be decoded
    #[error("Snapshot error in file '{file}': {message}")]
    Snapshot {
        file: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Structural problem with the PHA file (missing block or column, ambiguous layout)
    #[error("PHA format error in file '{file}': {message}")]
    Format { file: String, message: String },

    /// Required keyword unresolved after every fallback
    #[error("Keyword {keyword} not found. File '{file}' is not a proper PHA file")]
    MissingKeyword { file: String, keyword: String },

    /// Type II file decoded without a spectrum number
    #[error(
        "File '{file}' is a PHA Type II file: a spectrum number is required (use 'file{{n}}' or an explicit selector)"
    )]
    MissingSelector { file: String },

    /// Input requests a feature the decoder does not implement
    #[error("Unsupported feature in file '{file}': {feature}")]
    UnsupportedFeature { file: String, feature: String },

    /// Data validation error
    #[error("Data validation error: {message}")]
    Validation { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a snapshot decoding error
    pub fn snapshot(
        file: impl Into<String>,
        message: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::Snapshot {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a PHA format error
    pub fn format(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a missing keyword error
    pub fn missing_keyword(file: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self::MissingKeyword {
            file: file.into(),
            keyword: keyword.into(),
        }
    }

    /// Create a missing selector error
    pub fn missing_selector(file: impl Into<String>) -> Self {
        Self::MissingSelector { file: file.into() }
    }

    /// Create an unsupported feature error
    pub fn unsupported_feature(file: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            file: file.into(),
            feature: feature.into(),
        }
    }

    /// Create a data validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}
