//! Brightness statistic of a vertical wire.
//!
//! The wire is located independently in every row as the
//! brightest pixel of that row. Rows too dim to contain the
//! wire are dropped, and the statistic is taken over a
//! centred band of the remaining rows so that the wire's
//! cooler ends (near the clamps) do not bias it.

use ndarray::Axis;

use crate::{
    error::{Error, Result},
    image::GrayscaleImage,
};

/// Share of the surviving rows the statistic is taken
/// over.
pub const DEFAULT_CHOOSE_PERCENTAGE: f64 = 0.3;

/// Rows whose peak is not above this fraction of the mean
/// peak are treated as background.
const CONFIDENCE_RATIO: f64 = 0.8;

/// Brightest pixel of one image row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPeak {
    pub row: usize,
    pub column: usize,
    pub intensity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireBrightness {
    pub mean: f64,
    pub std: f64,
    /// Rows that passed the confidence filter.
    pub rows_kept: usize,
    /// Rows inside the centred window.
    pub rows_used: usize,
}

/// Per-row maxima, in row order. Ties go to the leftmost
/// column.
pub fn row_peaks(image: &GrayscaleImage) -> Vec<RowPeak> {
    image
        .pixels()
        .axis_iter(Axis(0))
        .enumerate()
        .filter_map(|(row, line)| {
            let mut best: Option<(usize, u8)> = None;
            for (column, &v) in line.iter().enumerate() {
                match best {
                    Some((_, b)) if v <= b => {}
                    _ => best = Some((column, v)),
                }
            }
            best.map(|(column, intensity)| RowPeak {
                row,
                column,
                intensity,
            })
        })
        .collect()
}

/// Mean and (population) standard deviation of the wire's
/// peak brightness over the central `choose_percentage` of
/// the rows where the wire is visible.
pub fn wire_brightness(image: &GrayscaleImage, choose_percentage: f64) -> Result<WireBrightness> {
    if !(0. ..=1.).contains(&choose_percentage) {
        return Err(Error::InvalidParameter(format!(
            "choose percentage must be in [0, 1], got {}",
            choose_percentage
        )));
    }

    let peaks = row_peaks(image);
    if peaks.is_empty() {
        return Err(Error::InsufficientData {
            what: "wire brightness (image has no rows)",
            needed: 1,
            found: 0,
        });
    }

    let mean_peak =
        peaks.iter().map(|p| p.intensity as f64).sum::<f64>() / peaks.len() as f64;
    let cutoff = mean_peak * CONFIDENCE_RATIO;
    let kept: Vec<f64> = peaks
        .iter()
        .filter(|p| p.intensity as f64 > cutoff)
        .map(|p| p.intensity as f64)
        .collect();
    if kept.is_empty() {
        return Err(Error::InsufficientData {
            what: "wire brightness (no rows above confidence cutoff)",
            needed: 1,
            found: 0,
        });
    }

    let len = kept.len();
    let center = len / 2;
    let shift = (len as f64 * choose_percentage).floor() as usize / 2;
    let window = &kept[center - shift..(center + shift + 1).min(len)];

    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(WireBrightness {
        mean,
        std: var.sqrt(),
        rows_kept: len,
        rows_used: window.len(),
    })
}
