//! Command-line argument definitions for pha-inspect
//!
//! This module defines the CLI interface using the clap derive API.

use crate::app::models::SpectrumRole;
use crate::{Error, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the PHA inspector
///
/// Decodes one OGIP PHA file (exported as a JSON table snapshot) and prints
/// the resulting spectrum together with any diagnostics.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pha-inspect",
    version,
    about = "Decode an OGIP PHA spectrum snapshot and print a summary",
    long_about = "Decodes the SPECTRUM extension of an OGIP PHA file (Type I or Type II), \
                  exported as a JSON table snapshot. Observed spectra are linked to the \
                  background their BACKFILE references; responses are looked up next to \
                  the input file."
)]
pub struct Args {
    /// PHA snapshot to decode
    ///
    /// A trailing `{n}` selects spectrum n of a Type II file and takes
    /// precedence over --spectrum.
    #[arg(value_name = "FILE")]
    pub file: String,

    /// 1-based spectrum number for Type II files
    #[arg(
        short = 's',
        long = "spectrum",
        value_name = "N",
        help = "Spectrum number for Type II files (1-based)"
    )]
    pub spectrum_number: Option<usize>,

    /// Decode the file as an observed spectrum or as a background
    #[arg(
        short = 'r',
        long = "role",
        value_enum,
        default_value = "observed",
        help = "Role of the decoded file"
    )]
    pub role: RoleArg,

    /// Response snapshot whose energy bounds replace the file's own
    ///
    /// Required with --role background, which never loads a response.
    #[arg(
        short = 'e',
        long = "ebounds",
        value_name = "FILE",
        help = "Response snapshot providing the energy bounds"
    )]
    pub ebounds: Option<PathBuf>,

    /// Output format
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        help = "Output format for the decoded spectrum"
    )]
    pub format: OutputFormat,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Role selector on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Observed,
    Background,
}

impl From<RoleArg> for SpectrumRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Observed => SpectrumRole::Observed,
            RoleArg::Background => SpectrumRole::Background,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Validate the arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.file.trim().is_empty() {
            return Err(Error::configuration("Input file must not be empty"));
        }

        if self.spectrum_number == Some(0) {
            return Err(Error::configuration("Spectrum numbers are 1-based"));
        }

        if self.role == RoleArg::Background && self.ebounds.is_none() {
            return Err(Error::configuration(
                "--role background needs --ebounds: a background has no response of its own",
            ));
        }

        if let Some(ebounds) = &self.ebounds {
            if !ebounds.exists() {
                return Err(Error::configuration(format!(
                    "Energy bounds file does not exist: {}",
                    ebounds.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}
