//! Configuration management and validation.
//!
//! Provides the decoder configuration: which table extension holds the
//! spectrum and whether non-fatal diagnostics are mirrored to the log.

use crate::constants::SPECTRUM_EXTENSION;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for PHA decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Name of the table extension holding the spectrum
    pub extension_name: String,

    /// Emit every diagnostic through `tracing::warn!` as well as returning it
    pub log_diagnostics: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            extension_name: SPECTRUM_EXTENSION.to_string(),
            log_diagnostics: true,
        }
    }
}

impl DecoderConfig {
    /// Create configuration with a custom extension name
    pub fn with_extension_name(mut self, name: impl Into<String>) -> Self {
        self.extension_name = name.into();
        self
    }

    /// Keep diagnostics on the result only
    pub fn without_diagnostic_logging(mut self) -> Self {
        self.log_diagnostics = false;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.extension_name.trim().is_empty() {
            return Err(Error::configuration("extension name must not be empty"));
        }

        debug!(
            "Decoder configuration: extension={}, log_diagnostics={}",
            self.extension_name, self.log_diagnostics
        );
        Ok(())
    }
}
