//! Command implementation for the pha-inspect CLI
//!
//! This module wires the filesystem adapters to the decoder, sets up logging
//! and renders the decoded spectrum for humans or as JSON.

use crate::app::adapters::filesystem::{JsonResponseLoader, JsonTableReader, load_response_snapshot};
use crate::app::models::diagnostics::Diagnostic;
use crate::app::models::{QualityFlag, Spectrum, SpectrumRole};
use crate::app::services::pha_decoder::{DecodeResult, FileReference, PhaDecoder};
use crate::cli::args::{Args, OutputFormat};
use crate::config::DecoderConfig;
use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Channel counts per quality flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualitySummary {
    pub good: usize,
    pub warn: usize,
    pub bad: usize,
}

/// Serializable view of a decoded spectrum
#[derive(Debug, Clone, Serialize)]
pub struct SpectrumSummary {
    pub role: SpectrumRole,
    pub file: Option<String>,
    pub telescope: String,
    pub instrument: String,
    pub n_channels: usize,
    pub exposure: f64,
    pub is_poisson: bool,
    pub scale_factor: Option<f64>,
    pub ancillary_file: Option<String>,
    pub ebounds: Vec<f64>,
    pub counts: Vec<f64>,
    pub rates: Vec<f64>,
    pub rate_errors: Option<Vec<f64>>,
    pub sys_errors: Vec<f64>,
    pub quality: QualitySummary,
    pub background: Option<Box<SpectrumSummary>>,
}

impl SpectrumSummary {
    pub fn from_spectrum(spectrum: &Spectrum) -> Self {
        let quality = spectrum.quality();

        Self {
            role: spectrum.role(),
            file: spectrum.file_name().map(|p| p.display().to_string()),
            telescope: spectrum.telescope().to_string(),
            instrument: spectrum.instrument().to_string(),
            n_channels: spectrum.n_channels(),
            exposure: spectrum.exposure(),
            is_poisson: spectrum.is_poisson(),
            scale_factor: spectrum.scale_factor(),
            ancillary_file: spectrum.ancillary_file().map(str::to_string),
            ebounds: spectrum.ebounds().to_vec(),
            counts: spectrum.counts(),
            rates: spectrum.rates().to_vec(),
            rate_errors: spectrum.rate_errors().ok().map(<[f64]>::to_vec),
            sys_errors: spectrum.sys_errors().to_vec(),
            quality: QualitySummary {
                good: quality.count(QualityFlag::Good),
                warn: quality.count(QualityFlag::Warn),
                bad: quality.count(QualityFlag::Bad),
            },
            background: spectrum
                .background()
                .map(|background| Box::new(Self::from_spectrum(background))),
        }
    }

    /// Sum of counts over all channels
    pub fn total_counts(&self) -> f64 {
        self.counts.iter().sum()
    }
}

/// Outcome of one CLI run
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub spectrum: SpectrumSummary,

    /// Resolved keywords of the decoded file; `None` for an explicit NONE
    pub keywords: BTreeMap<String, Option<String>>,

    pub diagnostics: Vec<Diagnostic>,
}

impl InspectReport {
    pub fn from_result(result: &DecodeResult) -> Self {
        let keywords = result
            .keywords
            .iter()
            .map(|(field, value)| {
                (
                    field.keyword().to_string(),
                    value.value().map(|v| v.to_string()),
                )
            })
            .collect();

        Self {
            spectrum: SpectrumSummary::from_spectrum(&result.spectrum),
            keywords,
            diagnostics: result.diagnostics.clone(),
        }
    }
}

/// Main command runner for pha-inspect
///
/// 1. Set up logging and validate arguments
/// 2. Decode the file through the JSON snapshot adapters
/// 3. Print the summary and the diagnostics
pub fn run(args: Args) -> Result<InspectReport> {
    setup_logging(&args);

    debug!("Command line arguments: {:?}", args);
    args.validate()?;

    let file_ref = FileReference::parse(&args.file)?;
    let (base_dir, file_name) = split_reference(file_ref.path())?;
    let spectrum_number = file_ref.spectrum_number.or(args.spectrum_number);

    let reader = JsonTableReader::new().with_base_dir(&base_dir);
    let responses = JsonResponseLoader::new().with_base_dir(&base_dir);

    let ebounds = match &args.ebounds {
        Some(path) => Some(
            load_response_snapshot(path)
                .with_context(|| format!("Failed to load energy bounds from {}", path.display()))?
                .ebounds,
        ),
        None => None,
    };

    // Diagnostics are printed below rather than logged
    let config = DecoderConfig::default().without_diagnostic_logging();
    let decoder = PhaDecoder::new(&reader, &responses).with_config(config);

    let result = decoder
        .decode(
            &file_name,
            spectrum_number,
            args.role.into(),
            ebounds.as_deref(),
        )
        .with_context(|| format!("Failed to decode {}", args.file))?;

    let report = InspectReport::from_result(&result);
    info!(
        "Decoded {} with {} diagnostics",
        args.file,
        report.diagnostics.len()
    );

    match args.format {
        OutputFormat::Human => print_human(&report),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        ),
    }

    if !args.quiet {
        for diagnostic in &report.diagnostics {
            eprintln!("{} {}", "warning:".yellow().bold(), diagnostic);
        }
    }

    Ok(report)
}

/// Split a path into the directory references resolve against and the file name
fn split_reference(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Not a file path: {}", path.display()))?
        .to_string_lossy()
        .to_string();

    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((base_dir, file_name))
}

/// Set up structured logging on stderr
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ogip_pha={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

fn print_human(report: &InspectReport) {
    print_spectrum(&report.spectrum, "");

    if let Some(background) = &report.spectrum.background {
        println!();
        print_spectrum(background, "  ");
    }
}

fn print_spectrum(summary: &SpectrumSummary, indent: &str) {
    let title = match summary.role {
        SpectrumRole::Observed => "Observed spectrum".bold().green(),
        SpectrumRole::Background => "Background spectrum".bold().cyan(),
    };
    println!(
        "{}{}: {}",
        indent,
        title,
        summary.file.as_deref().unwrap_or("<memory>")
    );

    println!(
        "{}  Instrument:   {} / {}",
        indent, summary.telescope, summary.instrument
    );
    println!("{}  Channels:     {}", indent, summary.n_channels);

    if let (Some(low), Some(high)) = (summary.ebounds.first(), summary.ebounds.last()) {
        println!("{}  Energy range: {} - {}", indent, low, high);
    }

    println!("{}  Exposure:     {:.3} s", indent, summary.exposure);
    println!("{}  Total counts: {:.1}", indent, summary.total_counts());
    println!(
        "{}  Errors:       {}",
        indent,
        if summary.is_poisson {
            "Poisson"
        } else {
            "Gaussian (STAT_ERR)"
        }
    );

    if let Some(scale_factor) = summary.scale_factor {
        println!("{}  BACKSCAL:     {}", indent, scale_factor);
    }
    if let Some(ancillary_file) = &summary.ancillary_file {
        println!("{}  ANCRFILE:     {}", indent, ancillary_file);
    }

    let bad = if summary.quality.bad > 0 {
        summary.quality.bad.to_string().red()
    } else {
        summary.quality.bad.to_string().normal()
    };
    println!(
        "{}  Quality:      {} good, {} warn, {} bad",
        indent, summary.quality.good, summary.quality.warn, bad
    );
}
