//! Structured diagnostics for non-compliant PHA input
//!
//! Input that breaks the OGIP conventions but still yields a usable default
//! is recovered locally. Each recovery is recorded as a [`Diagnostic`] on the
//! decode result so callers can inspect or log it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The recovery that was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// POISSERR missing; errors taken from the STAT_ERR column
    AssumedNonPoisson,

    /// ANCRFILE missing; no ancillary file assumed
    MissingAncillaryFile,

    /// Neither a QUALITY card nor a QUALITY column; every channel assumed good
    MissingQuality,
}

impl DiagnosticKind {
    /// Keyword or column the diagnostic concerns
    pub fn keyword(self) -> &'static str {
        match self {
            DiagnosticKind::AssumedNonPoisson => "POISSERR",
            DiagnosticKind::MissingAncillaryFile => "ANCRFILE",
            DiagnosticKind::MissingQuality => "QUALITY",
        }
    }

    /// Get human-readable description of this recovery
    pub fn description(self) -> &'static str {
        match self {
            DiagnosticKind::AssumedNonPoisson => {
                "POISSERR is not set. Assuming non-poisson errors as given in the STAT_ERR column"
            }
            DiagnosticKind::MissingAncillaryFile => {
                "ANCRFILE is not set. This is not a compliant OGIP file. Assuming no ARF."
            }
            DiagnosticKind::MissingQuality => {
                "Could not find QUALITY in columns or header of PHA file. This is not a valid OGIP file. Assuming QUALITY=0 (good)"
            }
        }
    }
}

/// One recovered non-compliance in one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    /// File reference the diagnostic was raised for
    pub file: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
        }
    }

    pub fn keyword(&self) -> &'static str {
        self.kind.keyword()
    }

    pub fn message(&self) -> &'static str {
        self.kind.description()
    }

    /// Mirror the diagnostic to the log
    pub fn log(&self) {
        warn!("{}", self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message())
    }
}
