//! Core PHA decoder implementation
//!
//! This module orchestrates layout dispatch, keyword resolution, counts/rate
//! normalization, error and quality extraction, and background linking.

use super::keywords::{Field, KeywordResolver, KeywordValue, ResolvedKeywords};
use super::layout::{FileReference, Layout};
use super::quality::reduce_quality;
use super::result::DecodeResult;
use crate::app::adapters::table::{PhaTable, Response, ResponseLoader, TableReader};
use crate::app::models::diagnostics::Diagnostic;
use crate::app::models::{ObservedLinks, Spectrum, SpectrumParts, SpectrumRole};
use crate::config::DecoderConfig;
use crate::constants::{columns, keywords};
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Decoder for OGIP PHA files
///
/// Reads tables through a [`TableReader`] and responses through a
/// [`ResponseLoader`]. Each call opens the files it needs and releases them
/// before returning.
pub struct PhaDecoder<'a> {
    reader: &'a dyn TableReader,
    responses: &'a dyn ResponseLoader,
    config: DecoderConfig,
}

/// Everything read from one file, before the spectrum kind is chosen
struct DecodedFile {
    parts: SpectrumParts,
    count_errors: Option<Vec<f64>>,
    response: Option<Arc<dyn Response>>,
    scale_factor: Option<f64>,
    background_file: Option<String>,
    keywords: ResolvedKeywords,
}

impl DecodedFile {
    fn into_observed(self, background: Option<Spectrum>) -> Result<Spectrum> {
        let links = ObservedLinks {
            response: self.response,
            scale_factor: self.scale_factor,
            background,
        };

        match self.count_errors {
            Some(count_errors) => Spectrum::observed(self.parts, count_errors, links),
            None => Spectrum::poisson(self.parts, links),
        }
    }

    fn into_background(self, source_file: Option<PathBuf>) -> Result<Spectrum> {
        match self.count_errors {
            Some(count_errors) => Spectrum::background_spectrum(self.parts, count_errors, source_file),
            None => Spectrum::poisson_background(self.parts, source_file),
        }
    }
}

impl<'a> PhaDecoder<'a> {
    /// Create a decoder over the given collaborators
    pub fn new(reader: &'a dyn TableReader, responses: &'a dyn ResponseLoader) -> Self {
        Self {
            reader,
            responses,
            config: DecoderConfig::default(),
        }
    }

    /// Configure the decoder
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode an observed spectrum and its background, if one is referenced
    pub fn decode_observed(
        &self,
        reference: &str,
        spectrum_number: Option<usize>,
    ) -> Result<DecodeResult> {
        self.decode(reference, spectrum_number, SpectrumRole::Observed, None)
    }

    /// Decode a background spectrum on the energy bounds of its source
    pub fn decode_background(
        &self,
        reference: &str,
        spectrum_number: Option<usize>,
        ebounds: &[f64],
    ) -> Result<DecodeResult> {
        self.decode(
            reference,
            spectrum_number,
            SpectrumRole::Background,
            Some(ebounds),
        )
    }

    /// Decode a PHA file
    ///
    /// `reference` may end in `{n}` to select spectrum `n` of a Type II file;
    /// the suffix takes precedence over `spectrum_number`. `ebounds`, when
    /// given, replaces the energy bounds of the file's response and is
    /// mandatory for backgrounds.
    pub fn decode(
        &self,
        reference: &str,
        spectrum_number: Option<usize>,
        role: SpectrumRole,
        ebounds: Option<&[f64]>,
    ) -> Result<DecodeResult> {
        self.config.validate()?;

        info!("Decoding {} PHA file: {}", role, reference);

        let mut diagnostics = Vec::new();
        let outcome = FileReference::resolve(reference, spectrum_number).and_then(|file_ref| {
            match role {
                SpectrumRole::Observed => {
                    self.decode_with_background(&file_ref, ebounds, &mut diagnostics)
                }
                SpectrumRole::Background => {
                    let decoded =
                        self.read_file(&file_ref, SpectrumRole::Background, ebounds, &mut diagnostics)?;
                    let keywords = decoded.keywords.clone();
                    Ok((decoded.into_background(None)?, keywords))
                }
            }
        });

        if self.config.log_diagnostics {
            diagnostics.iter().for_each(Diagnostic::log);
        }

        let (spectrum, keywords) = outcome?;

        info!(
            "Decoded {} channels from {} ({} diagnostics)",
            spectrum.n_channels(),
            reference,
            diagnostics.len()
        );

        Ok(DecodeResult {
            spectrum,
            diagnostics,
            keywords,
        })
    }

    /// Observed file plus the background it references
    ///
    /// The background is read with the background role, which never resolves
    /// BACKFILE, so linking stops after one level.
    fn decode_with_background(
        &self,
        file_ref: &FileReference,
        ebounds: Option<&[f64]>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(Spectrum, ResolvedKeywords)> {
        let decoded = self.read_file(file_ref, SpectrumRole::Observed, ebounds, diagnostics)?;

        let background = match &decoded.background_file {
            Some(reference) => {
                // Background rows line up with source rows in Type II files
                let background_ref = FileReference::resolve(reference, file_ref.spectrum_number)?;
                debug!(
                    "Decoding background {} for {}",
                    background_ref.display_name(),
                    file_ref.display_name()
                );

                let background = self.read_file(
                    &background_ref,
                    SpectrumRole::Background,
                    Some(&decoded.parts.ebounds),
                    diagnostics,
                )?;
                Some(background.into_background(Some(file_ref.path.clone()))?)
            }
            None => None,
        };

        let keywords = decoded.keywords.clone();
        Ok((decoded.into_observed(background)?, keywords))
    }

    /// Read one file for the given role
    fn read_file(
        &self,
        file_ref: &FileReference,
        role: SpectrumRole,
        ebounds: Option<&[f64]>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<DecodedFile> {
        let file = file_ref.display_name();
        let extension = &self.config.extension_name;

        let table = self
            .reader
            .open_extension(file_ref.path(), extension)?
            .ok_or_else(|| {
                Error::format(
                    &file,
                    format!(
                        "The input file {} is not in PHA format (no {} extension)",
                        file, extension
                    ),
                )
            })?;
        let table = table.as_ref();

        let layout = Layout::dispatch(table, &file, file_ref.spectrum_number)?;
        let resolver = KeywordResolver::new(table, &layout, role, &file);
        let resolved = resolver.resolve(diagnostics)?;

        reject_correction(&resolver, &file)?;

        let exposure = resolved.require_number(Field::Exposure)?;
        let is_poisson = resolved
            .flag(Field::PoissonErrors)?
            .ok_or_else(|| Error::missing_keyword(&file, keywords::POISSERR))?;

        let value_column = layout.value_column;
        let mut counts = read_channels(table, &layout, value_column.column_name(), &file)?;
        if value_column.is_rate() {
            scale(&mut counts, exposure);
        }

        let count_errors = if is_poisson {
            None
        } else {
            let mut errors = read_channels(table, &layout, columns::STAT_ERR, &file)?;
            if value_column.is_rate() {
                scale(&mut errors, exposure);
            }
            Some(errors)
        };

        let sys_errors = if table.has_column(columns::SYS_ERR) {
            Some(read_channels(table, &layout, columns::SYS_ERR, &file)?)
        } else {
            None
        };

        let n_channels = counts.len();
        let quality = reduce_quality(table, &layout, n_channels, &file, diagnostics)?;

        let response = match role {
            SpectrumRole::Observed => match resolved.text(Field::ResponseFile) {
                Some(reference) => Some(self.responses.load(&reference)?),
                None => None,
            },
            SpectrumRole::Background => None,
        };

        let ebounds = match (ebounds, &response) {
            (Some(ebounds), _) => ebounds.to_vec(),
            (None, Some(response)) => response.ebounds().to_vec(),
            (None, None) => {
                return Err(Error::validation(format!(
                    "No energy bounds for '{}': the file has no response and none were supplied",
                    file
                )));
            }
        };

        check_detchans(&resolved, n_channels, &file)?;

        let (scale_factor, background_file) = match role {
            SpectrumRole::Observed => (
                resolved.number(Field::ScaleFactor)?,
                resolved.text(Field::BackgroundFile),
            ),
            SpectrumRole::Background => (None, None),
        };

        let parts = SpectrumParts {
            counts,
            exposure,
            ebounds,
            sys_errors,
            quality: Some(quality),
            ancillary_file: resolved.text(Field::AncillaryFile),
            telescope: resolved.text(Field::Telescope),
            instrument: resolved.text(Field::Instrument),
            file_name: Some(file_ref.path.clone()),
        };

        debug!(
            "Read {} channels from {} ({:?}, {}, poisson={})",
            n_channels,
            file,
            layout.kind,
            value_column.column_name(),
            is_poisson
        );

        Ok(DecodedFile {
            parts,
            count_errors,
            response,
            scale_factor,
            background_file,
            keywords: resolved,
        })
    }
}

/// Refuse files asking for a correction (CORRFILE) spectrum
fn reject_correction(resolver: &KeywordResolver<'_>, file: &str) -> Result<()> {
    if let Some(KeywordValue::Present(value)) = resolver.lookup(keywords::CORRFILE)? {
        return Err(Error::unsupported_feature(
            file,
            format!("CORRFILE ({}) is not yet supported", value),
        ));
    }
    Ok(())
}

/// Channel values of the selected spectrum from a data column
fn read_channels(table: &dyn PhaTable, layout: &Layout, name: &str, file: &str) -> Result<Vec<f64>> {
    let column = table
        .column(name)
        .ok_or_else(|| Error::format(file, format!("Missing {} column", name)))?;

    match layout.row {
        Some(row) => column.row_vector(row).map(<[f64]>::to_vec).ok_or_else(|| {
            Error::format(
                file,
                format!("{} column has no per-channel vector for spectrum {}", name, row + 1),
            )
        }),
        None => column.to_f64_vec().ok_or_else(|| {
            Error::format(
                file,
                format!("{} column must hold one number per channel", name),
            )
        }),
    }
}

fn scale(values: &mut [f64], exposure: f64) {
    values.iter_mut().for_each(|v| *v *= exposure);
}

/// Channel count must match DETCHANS
fn check_detchans(keywords: &ResolvedKeywords, n_channels: usize, file: &str) -> Result<()> {
    let detchans = keywords.require_number(Field::DetectorChannels)?;

    if detchans.fract() != 0.0 || detchans < 0.0 || detchans as usize != n_channels {
        return Err(Error::validation(format!(
            "The data column (RATES or COUNTS) of '{}' has {} entries but DETCHANS declares {}",
            file, n_channels, detchans
        )));
    }
    Ok(())
}
