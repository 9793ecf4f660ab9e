//! Convert image brightness to temperature.
//!
//! Every lit interior pixel is replaced by an aggregate
//! (by default the maximum) of its neighbourhood, and the
//! graduation polynomial is evaluated on the result. Pixels
//! that get no aggregate of their own (the one pixel border
//! and the background) take the dimmest aggregate seen, so
//! the map has no artificial cold spots at 0 brightness.

use std::str::FromStr;

use itertools::iproduct;
use ndarray::{s, Array2, ArrayView2};
use serde_derive::*;

use crate::{
    error::{Error, Result},
    image::GrayscaleImage,
    polynomial::Polynomial,
};

/// Neighbourhood half-width; 1 gives a 3x3 window.
pub const DEFAULT_SHIFT: usize = 1;

/// Neighbourhood aggregation applied before the
/// graduation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Max,
    Min,
    Mean,
    Median,
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Max
    }
}

impl Aggregation {
    pub fn aggregate(self, window: ArrayView2<u8>) -> f64 {
        match self {
            Aggregation::Max => window.iter().copied().max().unwrap_or(0) as f64,
            Aggregation::Min => window.iter().copied().min().unwrap_or(0) as f64,
            Aggregation::Mean => {
                if window.is_empty() {
                    0.
                } else {
                    window.iter().map(|&v| v as f64).sum::<f64>() / window.len() as f64
                }
            }
            Aggregation::Median => {
                let mut values: Vec<u8> = window.iter().copied().collect();
                values.sort_unstable();
                let n = values.len();
                match n {
                    0 => 0.,
                    _ if n % 2 == 1 => values[n / 2] as f64,
                    _ => (values[n / 2 - 1] as f64 + values[n / 2] as f64) / 2.,
                }
            }
        }
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(Aggregation::Max),
            "min" => Ok(Aggregation::Min),
            "mean" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            _ => Err(Error::InvalidParameter(format!(
                "unknown aggregation `{}` (expected max, min, mean or median)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapOptions {
    pub aggregation: Aggregation,
    pub shift: usize,
}

impl Default for MapOptions {
    fn default() -> Self {
        MapOptions {
            aggregation: Aggregation::default(),
            shift: DEFAULT_SHIFT,
        }
    }
}

/// Per-pixel temperatures, same shape as the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureMap {
    values: Array2<f64>,
    background: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl TemperatureMap {
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// `(rows, columns)`
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Brightness the border and background were filled
    /// with before the graduation was applied.
    pub fn background_brightness(&self) -> f64 {
        self.background
    }

    pub fn summary(&self) -> MapSummary {
        let (min, max, sum) = self.values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        );
        let mean = if self.values.is_empty() {
            f64::NAN
        } else {
            sum / self.values.len() as f64
        };
        MapSummary { min, max, mean }
    }
}

/// Apply `graduation` to `image` with one of the built-in
/// aggregations.
pub fn apply_graduation(
    image: &GrayscaleImage,
    graduation: &Polynomial,
    options: &MapOptions,
) -> TemperatureMap {
    let aggregation = options.aggregation;
    apply_graduation_with(image, graduation, |w| aggregation.aggregate(w), options.shift)
}

/// Apply `graduation` to `image`, aggregating each
/// `(2 shift + 1)`-square window with `aggregate`.
///
/// Windows are clipped to the image. Only pixels off the
/// outermost row/column and with non-zero intensity are
/// aggregated; if none yields a non-zero value the fill
/// brightness is 0.
pub fn apply_graduation_with<F>(
    image: &GrayscaleImage,
    graduation: &Polynomial,
    aggregate: F,
    shift: usize,
) -> TemperatureMap
where
    F: Fn(ArrayView2<u8>) -> f64,
{
    let pixels = image.pixels();
    let (ht, wid) = pixels.dim();
    let mut brightness = Array2::<f64>::zeros((ht, wid));
    let mut background: Option<f64> = None;

    if ht > 2 && wid > 2 {
        for (row, col) in iproduct!(1..ht - 1, 1..wid - 1) {
            if pixels[(row, col)] == 0 {
                continue;
            }
            let window = pixels.slice(s![
                row.saturating_sub(shift)..(row + shift + 1).min(ht),
                col.saturating_sub(shift)..(col + shift + 1).min(wid)
            ]);
            let value = aggregate(window);
            brightness[(row, col)] = value;

            if value != 0. {
                background = Some(background.map_or(value, |b| b.min(value)));
            }
        }
    }

    let background = background.unwrap_or(0.);
    let values = brightness.mapv(|v| graduation.eval(if v == 0. { background } else { v }));

    TemperatureMap { values, background }
}
