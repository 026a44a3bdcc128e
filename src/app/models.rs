//! Data models for PHA spectra
//!
//! This module contains the validated spectrum entity produced by the decoder,
//! the per-channel quality model, and the observed/background role
//! discriminant. A single [`Spectrum`] type covers Poisson and non-Poisson,
//! observed and background spectra; the four kinds are built through
//! dedicated factory functions that enforce the field-presence rules.

pub mod diagnostics;

use crate::app::adapters::table::Response;
use crate::constants::{UNKNOWN_NAME, quality_codes};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

// =============================================================================
// Spectrum Role
// =============================================================================

/// Whether a PHA file holds the observation itself or its background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrumRole {
    Observed,
    Background,
}

impl SpectrumRole {
    pub fn as_str(self) -> &'static str {
        match self {
            SpectrumRole::Observed => "observed",
            SpectrumRole::Background => "background",
        }
    }
}

impl fmt::Display for SpectrumRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpectrumRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "observed" => Ok(SpectrumRole::Observed),
            "background" => Ok(SpectrumRole::Background),
            other => Err(Error::configuration(format!(
                "Unrecognized file type '{}': must be 'observed' or 'background'",
                other
            ))),
        }
    }
}

// =============================================================================
// Quality Flag Enumeration
// =============================================================================

/// Usability of a single channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityFlag {
    Good,
    Warn,
    Bad,
}

impl QualityFlag {
    /// Reduce a raw OGIP quality code: 0 is good, 2 is warn, anything else is bad
    pub fn from_ogip(code: i64) -> Self {
        match code {
            quality_codes::GOOD => QualityFlag::Good,
            quality_codes::WARN => QualityFlag::Warn,
            _ => QualityFlag::Bad,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityFlag::Good => "good",
            QualityFlag::Warn => "warn",
            QualityFlag::Bad => "bad",
        }
    }
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel quality flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality {
    flags: Vec<QualityFlag>,
}

impl Quality {
    pub fn new(flags: Vec<QualityFlag>) -> Self {
        Self { flags }
    }

    /// Reduce raw OGIP codes channel by channel
    pub fn from_ogip(codes: &[i64]) -> Self {
        Self {
            flags: codes.iter().copied().map(QualityFlag::from_ogip).collect(),
        }
    }

    /// Every channel good
    pub fn all_good(n_channels: usize) -> Self {
        Self {
            flags: vec![QualityFlag::Good; n_channels],
        }
    }

    pub fn flags(&self) -> &[QualityFlag] {
        &self.flags
    }

    pub fn n_elements(&self) -> usize {
        self.flags.len()
    }

    /// Mask of good channels
    pub fn good(&self) -> Vec<bool> {
        self.mask(QualityFlag::Good)
    }

    /// Mask of warned channels
    pub fn warn(&self) -> Vec<bool> {
        self.mask(QualityFlag::Warn)
    }

    /// Mask of bad channels
    pub fn bad(&self) -> Vec<bool> {
        self.mask(QualityFlag::Bad)
    }

    /// Number of channels carrying `flag`
    pub fn count(&self, flag: QualityFlag) -> usize {
        self.flags.iter().filter(|f| **f == flag).count()
    }

    fn mask(&self, flag: QualityFlag) -> Vec<bool> {
        self.flags.iter().map(|f| *f == flag).collect()
    }
}

// =============================================================================
// Spectrum Construction Inputs
// =============================================================================

/// Fields shared by every spectrum kind
#[derive(Debug, Clone, Default)]
pub struct SpectrumParts {
    /// Counts per channel
    pub counts: Vec<f64>,

    /// Exposure in seconds
    pub exposure: f64,

    /// Channel energy edges, one more than the number of channels
    pub ebounds: Vec<f64>,

    /// Systematic error per channel; zeros when absent
    pub sys_errors: Option<Vec<f64>>,

    /// Channel quality; all good when absent
    pub quality: Option<Quality>,

    pub ancillary_file: Option<String>,
    pub telescope: Option<String>,
    pub instrument: Option<String>,
    pub file_name: Option<PathBuf>,
}

impl SpectrumParts {
    pub fn new(counts: Vec<f64>, exposure: f64, ebounds: Vec<f64>) -> Self {
        Self {
            counts,
            exposure,
            ebounds,
            ..Self::default()
        }
    }

    pub fn with_sys_errors(mut self, sys_errors: Vec<f64>) -> Self {
        self.sys_errors = Some(sys_errors);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_ancillary_file(mut self, ancillary_file: impl Into<String>) -> Self {
        self.ancillary_file = Some(ancillary_file.into());
        self
    }

    pub fn with_telescope(mut self, telescope: impl Into<String>) -> Self {
        self.telescope = Some(telescope.into());
        self
    }

    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<PathBuf>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Links only an observed spectrum may carry
#[derive(Debug, Clone, Default)]
pub struct ObservedLinks {
    pub response: Option<Arc<dyn Response>>,

    /// BACKSCAL of the source region
    pub scale_factor: Option<f64>,

    /// Background spectrum, which must have been built as a background
    pub background: Option<Spectrum>,
}

/// Role-specific state; a background has no slot for a response, a scale
/// factor or a further background.
#[derive(Debug, Clone)]
enum RoleLinks {
    Observed {
        response: Option<Arc<dyn Response>>,
        scale_factor: Option<f64>,
        background: Option<Box<Spectrum>>,
    },
    Background {
        source_file: Option<PathBuf>,
    },
}

// =============================================================================
// Spectrum
// =============================================================================

/// A binned spectrum stored as rates
#[derive(Debug, Clone)]
pub struct Spectrum {
    rates: Vec<f64>,
    rate_errors: Option<Vec<f64>>,
    sys_errors: Vec<f64>,
    quality: Quality,
    exposure: f64,
    ebounds: Vec<f64>,
    is_poisson: bool,
    ancillary_file: Option<String>,
    telescope: Option<String>,
    instrument: Option<String>,
    file_name: Option<PathBuf>,
    links: RoleLinks,
}

impl Spectrum {
    /// Observed spectrum with explicit (non-Poisson) count errors
    pub fn observed(parts: SpectrumParts, count_errors: Vec<f64>, links: ObservedLinks) -> Result<Self> {
        let links = observed_links(links)?;
        Self::build(parts, Some(count_errors), false, links)
    }

    /// Observed spectrum with Poisson errors
    pub fn poisson(parts: SpectrumParts, links: ObservedLinks) -> Result<Self> {
        let links = observed_links(links)?;
        Self::build(parts, None, true, links)
    }

    /// Background spectrum with explicit (non-Poisson) count errors
    pub fn background_spectrum(
        parts: SpectrumParts,
        count_errors: Vec<f64>,
        source_file: Option<PathBuf>,
    ) -> Result<Self> {
        Self::build(parts, Some(count_errors), false, RoleLinks::Background { source_file })
    }

    /// Background spectrum with Poisson errors
    pub fn poisson_background(parts: SpectrumParts, source_file: Option<PathBuf>) -> Result<Self> {
        Self::build(parts, None, true, RoleLinks::Background { source_file })
    }

    fn build(
        parts: SpectrumParts,
        count_errors: Option<Vec<f64>>,
        is_poisson: bool,
        links: RoleLinks,
    ) -> Result<Self> {
        let SpectrumParts {
            counts,
            exposure,
            ebounds,
            sys_errors,
            quality,
            ancillary_file,
            telescope,
            instrument,
            file_name,
        } = parts;

        // Name the file in errors when known
        let origin = match &file_name {
            Some(path) => format!(" in '{}'", path.display()),
            None => String::new(),
        };

        let n_channels = counts.len();
        if n_channels == 0 {
            return Err(Error::validation(format!("spectrum{} has no channels", origin)));
        }

        if !(exposure.is_finite() && exposure > 0.0) {
            return Err(Error::validation(format!(
                "exposure{} must be a positive number of seconds, got {}",
                origin, exposure
            )));
        }

        if ebounds.len() != n_channels + 1 {
            return Err(Error::validation(format!(
                "read {} channels but {} energy boundaries{}. Should be n+1",
                n_channels,
                ebounds.len(),
                origin
            )));
        }

        let rate_errors = match count_errors {
            Some(errors) => {
                check_length("count errors", errors.len(), n_channels, &origin)?;
                Some(errors.iter().map(|e| e / exposure).collect())
            }
            None => None,
        };

        let sys_errors = match sys_errors {
            Some(errors) => {
                check_length("sys errors", errors.len(), n_channels, &origin)?;
                errors
            }
            None => vec![0.0; n_channels],
        };

        let quality = match quality {
            Some(quality) => {
                check_length("quality flags", quality.n_elements(), n_channels, &origin)?;
                quality
            }
            None => Quality::all_good(n_channels),
        };

        let rates = counts.iter().map(|c| c / exposure).collect();

        Ok(Self {
            rates,
            rate_errors,
            sys_errors,
            quality,
            exposure,
            ebounds,
            is_poisson,
            ancillary_file,
            telescope,
            instrument,
            file_name,
            links,
        })
    }

    /// Rates per channel
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Counts per channel (rates times exposure)
    pub fn counts(&self) -> Vec<f64> {
        self.rates.iter().map(|r| r * self.exposure).collect()
    }

    /// Errors on the rates, from the STAT_ERR column
    ///
    /// Fails on a Poisson spectrum, whose variance derives from the rates.
    pub fn rate_errors(&self) -> Result<&[f64]> {
        self.rate_errors.as_deref().ok_or_else(|| {
            Error::validation("Cannot request errors on rates for a Poisson spectrum")
        })
    }

    /// Errors on the counts; fails on a Poisson spectrum
    pub fn count_errors(&self) -> Result<Vec<f64>> {
        Ok(self
            .rate_errors()?
            .iter()
            .map(|e| e * self.exposure)
            .collect())
    }

    pub fn n_channels(&self) -> usize {
        self.rates.len()
    }

    /// Systematic errors per channel; zero unless SYS_ERR was present
    pub fn sys_errors(&self) -> &[f64] {
        &self.sys_errors
    }

    pub fn quality(&self) -> &Quality {
        &self.quality
    }

    /// Exposure in seconds
    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    pub fn ebounds(&self) -> &[f64] {
        &self.ebounds
    }

    pub fn is_poisson(&self) -> bool {
        self.is_poisson
    }

    pub fn role(&self) -> SpectrumRole {
        match self.links {
            RoleLinks::Observed { .. } => SpectrumRole::Observed,
            RoleLinks::Background { .. } => SpectrumRole::Background,
        }
    }

    pub fn is_background(&self) -> bool {
        self.role() == SpectrumRole::Background
    }

    /// Background owned by an observed spectrum
    pub fn background(&self) -> Option<&Spectrum> {
        match &self.links {
            RoleLinks::Observed { background, .. } => background.as_deref(),
            RoleLinks::Background { .. } => None,
        }
    }

    /// BACKSCAL used to rescale background and source regions
    pub fn scale_factor(&self) -> Option<f64> {
        match &self.links {
            RoleLinks::Observed { scale_factor, .. } => *scale_factor,
            RoleLinks::Background { .. } => None,
        }
    }

    pub fn response(&self) -> Option<&Arc<dyn Response>> {
        match &self.links {
            RoleLinks::Observed { response, .. } => response.as_ref(),
            RoleLinks::Background { .. } => None,
        }
    }

    /// Path of the source spectrum a background was decoded for
    pub fn source_file(&self) -> Option<&Path> {
        match &self.links {
            RoleLinks::Background { source_file } => source_file.as_deref(),
            RoleLinks::Observed { .. } => None,
        }
    }

    /// Ancillary file reference, unparsed
    pub fn ancillary_file(&self) -> Option<&str> {
        self.ancillary_file.as_deref()
    }

    /// Mission name, or "UNKNOWN"
    pub fn telescope(&self) -> &str {
        self.telescope.as_deref().unwrap_or(UNKNOWN_NAME)
    }

    /// Instrument name, or "UNKNOWN"
    pub fn instrument(&self) -> &str {
        self.instrument.as_deref().unwrap_or(UNKNOWN_NAME)
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }
}

fn observed_links(links: ObservedLinks) -> Result<RoleLinks> {
    if let Some(background) = &links.background {
        if !background.is_background() {
            return Err(Error::validation(
                "background of a spectrum must be built as a background spectrum",
            ));
        }
    }

    Ok(RoleLinks::Observed {
        response: links.response,
        scale_factor: links.scale_factor,
        background: links.background.map(Box::new),
    })
}

fn check_length(what: &str, found: usize, n_channels: usize, origin: &str) -> Result<()> {
    if found != n_channels {
        return Err(Error::validation(format!(
            "read {} channels but {} {}{}. Should be equal",
            n_channels, found, what, origin
        )));
    }
    Ok(())
}
