//! Decode result structure
//!
//! Pairs the decoded spectrum with the diagnostics raised while decoding it
//! (and its background), and with the keywords resolved for the file.

use super::keywords::ResolvedKeywords;
use crate::app::models::Spectrum;
use crate::app::models::diagnostics::{Diagnostic, DiagnosticKind};

/// Decoded spectrum with diagnostics
#[derive(Debug, Clone)]
pub struct DecodeResult {
    /// The validated spectrum; owns its background when one was referenced
    pub spectrum: Spectrum,

    /// Non-fatal recoveries, source file first, then background
    pub diagnostics: Vec<Diagnostic>,

    /// Keywords resolved for the decoded file
    pub keywords: ResolvedKeywords,
}

impl DecodeResult {
    pub fn into_spectrum(self) -> Spectrum {
        self.spectrum
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Diagnostics of one kind
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}
