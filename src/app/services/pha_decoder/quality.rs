//! Reduction of OGIP quality information to channel flags

use super::layout::Layout;
use crate::app::adapters::table::{Column, PhaTable};
use crate::app::models::Quality;
use crate::app::models::diagnostics::{Diagnostic, DiagnosticKind};
use crate::constants::{columns, keywords, quality_codes};
use crate::{Error, Result};
use tracing::debug;

/// Build the quality flags of the selected spectrum
///
/// A scalar QUALITY card wins over a QUALITY column: 0 marks every channel
/// good, any other value marks every channel bad. Without either, every
/// channel is good and a diagnostic is recorded.
pub fn reduce_quality(
    table: &dyn PhaTable,
    layout: &Layout,
    n_channels: usize,
    file: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Quality> {
    let quality = if let Some(card) = table.header(keywords::QUALITY) {
        let code = card.as_i64().ok_or_else(|| {
            Error::validation(format!(
                "QUALITY card in '{}' is not an integer: '{}'",
                file, card
            ))
        })?;

        if code == quality_codes::GOOD {
            Quality::all_good(n_channels)
        } else {
            debug!("QUALITY card is {} in {}; every channel is bad", code, file);
            Quality::from_ogip(&vec![quality_codes::ALL_BAD; n_channels])
        }
    } else if let Some(column) = table.column(columns::QUALITY) {
        Quality::from_ogip(&quality_codes_at(column, layout, file)?)
    } else {
        diagnostics.push(Diagnostic::new(DiagnosticKind::MissingQuality, file));
        Quality::all_good(n_channels)
    };

    if quality.n_elements() != n_channels {
        return Err(Error::validation(format!(
            "QUALITY in '{}' has {} entries but the spectrum has {} channels",
            file,
            quality.n_elements(),
            n_channels
        )));
    }

    Ok(quality)
}

/// Raw codes of the selected spectrum
fn quality_codes_at(column: &Column, layout: &Layout, file: &str) -> Result<Vec<i64>> {
    let not_integral = || {
        Error::format(
            file,
            "QUALITY column holds values that are not integer codes",
        )
    };

    match layout.row {
        Some(row) => {
            let codes = column.row_vector(row).ok_or_else(|| {
                Error::format(
                    file,
                    format!("QUALITY column has no per-channel vector for spectrum {}", row + 1),
                )
            })?;

            codes
                .iter()
                .map(|&code| {
                    if code.is_finite() && code.fract() == 0.0 {
                        Ok(code as i64)
                    } else {
                        Err(not_integral())
                    }
                })
                .collect()
        }
        None => match column {
            Column::Cells(cells) => cells
                .iter()
                .map(|cell| cell.as_i64().ok_or_else(not_integral))
                .collect(),
            Column::Array(_) => Err(Error::format(
                file,
                "QUALITY column of a Type I file must hold one code per channel",
            )),
        },
    }
}
