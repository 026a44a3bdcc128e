//! OGIP PHA decoder
//!
//! This module turns the SPECTRUM extension of a PHA file into a validated
//! [`Spectrum`](crate::app::models::Spectrum), decoding the referenced
//! background file for observed spectra.
//!
//! ## Architecture
//!
//! The decoder is organized into logical components:
//! - [`layout`] - File reference parsing and Type I / Type II dispatch
//! - [`keywords`] - Header/column keyword resolution with fallback policies
//! - [`quality`] - Reduction of OGIP quality codes to channel flags
//! - [`decoder`] - Orchestration, counts/rate normalization, background linking
//! - [`result`] - Decode result with diagnostics
//!
//! ## Usage
//!
//! ```rust
//! use ogip_pha::app::adapters::memory::{MemoryReader, MemoryResponses};
//! use ogip_pha::PhaDecoder;
//!
//! # fn example(reader: &MemoryReader, responses: &MemoryResponses) -> ogip_pha::Result<()> {
//! let decoder = PhaDecoder::new(reader, responses);
//! let result = decoder.decode_observed("obs.pha{2}", None)?;
//!
//! println!("Decoded {} channels with {} diagnostics",
//!          result.spectrum.n_channels(),
//!          result.diagnostics.len());
//! # Ok(())
//! # }
//! ```

pub mod decoder;
pub mod keywords;
pub mod layout;
pub mod quality;
pub mod result;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use decoder::PhaDecoder;
pub use keywords::{Field, KeywordResolver, KeywordValue, ResolvedKeywords};
pub use layout::{FileReference, Layout, LayoutKind, ValueColumn};
pub use result::DecodeResult;
