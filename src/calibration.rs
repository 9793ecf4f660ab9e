//! Building a graduation from calibration images.
//!
//! Each calibration image shows the wire at a heating
//! current encoded in its file name as four digits of
//! milliamps (`wire_1500.png` is 1.5 A). One
//! [`BrightnessSample`] is extracted per image; files that
//! cannot be used are reported and skipped without
//! stopping the batch.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde_derive::*;

use crate::{
    brightness::{wire_brightness, DEFAULT_CHOOSE_PERCENTAGE},
    error::{Error, Result},
    image::{GrayscaleImage, DEFAULT_THRESHOLD},
    polynomial::{Polynomial, DEFAULT_DEGREE},
    reference::ReferenceTemperature,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOptions {
    pub threshold: u8,
    pub choose_percentage: f64,
    pub degree: usize,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        CalibrationOptions {
            threshold: DEFAULT_THRESHOLD,
            choose_percentage: DEFAULT_CHOOSE_PERCENTAGE,
            degree: DEFAULT_DEGREE,
        }
    }
}

/// Brightness of the wire at a known current.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrightnessSample {
    pub path: PathBuf,
    /// Heating current in amperes.
    pub current: f64,
    /// Reference temperature in kelvin.
    pub reference_temperature: f64,
    pub mean: f64,
    pub std: f64,
}

/// Heating current in amperes from the first run of four
/// digits in the file name.
pub fn parse_current(file_name: &str) -> Result<f64> {
    lazy_static! {
        static ref MILLIAMPS: Regex = Regex::new(r"[0-9]{4}").unwrap();
    }

    let digits = MILLIAMPS
        .find(file_name)
        .ok_or_else(|| Error::InvalidFilename(file_name.to_string()))?;
    let milliamps: u32 = digits
        .as_str()
        .parse()
        .map_err(|_| Error::InvalidFilename(file_name.to_string()))?;
    Ok(milliamps as f64 / 1000.)
}

/// Extract the brightness sample of a single calibration
/// image.
pub fn sample_from_path<R>(
    path: &Path,
    reference: &R,
    options: &CalibrationOptions,
) -> Result<BrightnessSample>
where
    R: ReferenceTemperature + ?Sized,
{
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let current = parse_current(&file_name)?;

    let image = GrayscaleImage::load(path, options.threshold)?;
    let brightness = wire_brightness(&image, options.choose_percentage)?;

    Ok(BrightnessSample {
        path: path.to_path_buf(),
        current,
        reference_temperature: reference.temperature(current),
        mean: brightness.mean,
        std: brightness.std,
    })
}

/// Samples gathered from a directory of calibration images.
#[derive(Debug, Default)]
pub struct SampleBatch {
    pub samples: Vec<BrightnessSample>,
    pub skipped: Vec<(PathBuf, Error)>,
}

impl SampleBatch {
    /// Process `paths` in order. A file that fails is logged
    /// and recorded in `skipped`; the rest still run.
    pub fn collect<'a, I, R>(paths: I, reference: &R, options: &CalibrationOptions) -> Self
    where
        I: IntoIterator<Item = &'a Path>,
        R: ReferenceTemperature + ?Sized,
    {
        let mut batch = SampleBatch::default();
        for path in paths {
            batch.push(path, sample_from_path(path, reference, options));
        }
        batch
    }

    /// Record the outcome of one file.
    pub fn push(&mut self, path: &Path, outcome: Result<BrightnessSample>) {
        match outcome {
            Ok(sample) => {
                debug!(
                    "{}: current={:.3}A temperature={:.2}K mean={:.2} std={:.2}",
                    path.display(),
                    sample.current,
                    sample.reference_temperature,
                    sample.mean,
                    sample.std
                );
                self.samples.push(sample);
            }
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                self.skipped.push((path.to_path_buf(), e));
            }
        }
    }

    /// `(mean brightness, reference temperature)` pairs, in
    /// sample order.
    pub fn fit_input(&self) -> (Vec<f64>, Vec<f64>) {
        self.samples
            .iter()
            .map(|s| (s.mean, s.reference_temperature))
            .unzip()
    }

    /// Fit the brightness to temperature graduation.
    pub fn fit(&self, degree: usize) -> Result<Polynomial> {
        let (means, temperatures) = self.fit_input();
        if means.len() <= degree {
            return Err(Error::InsufficientData {
                what: "graduation (usable calibration images)",
                needed: degree + 1,
                found: means.len(),
            });
        }
        Polynomial::fit(&means, &temperatures, degree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceCurve;
    use approx::assert_relative_eq;

    #[test]
    fn current_from_file_name() {
        assert_eq!(parse_current("wire_1500.png").unwrap(), 1.5);
        assert_eq!(parse_current("0875mA.jpg").unwrap(), 0.875);
        // first four digits of a longer run
        assert_eq!(parse_current("img12345.png").unwrap(), 1.234);
        assert!(matches!(
            parse_current("wire_150.png"),
            Err(Error::InvalidFilename(_))
        ));
    }

    fn write_wire(path: &Path, peak: u8) {
        let (w, h) = (9u32, 12u32);
        let img = image::GrayImage::from_fn(w, h, |x, _| {
            if x == 4 {
                image::Luma([peak])
            } else {
                image::Luma([0])
            }
        });
        img.save(path).unwrap();
    }

    #[test]
    fn bad_files_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("wire_1500.png");
        let unnamed = dir.path().join("wire.png");
        let corrupt = dir.path().join("wire_1700.png");
        write_wire(&good, 180);
        write_wire(&unnamed, 200);
        std::fs::write(&corrupt, b"not an image").unwrap();

        let paths = vec![good.clone(), unnamed.clone(), corrupt.clone()];
        let batch = SampleBatch::collect(
            paths.iter().map(|p| p.as_path()),
            &ReferenceCurve::default(),
            &CalibrationOptions::default(),
        );

        assert_eq!(batch.samples.len(), 1);
        assert_eq!(batch.samples[0].path, good);
        assert_eq!(batch.samples[0].mean, 180.);
        assert_eq!(batch.skipped.len(), 2);
        assert!(matches!(batch.skipped[0], (ref p, Error::InvalidFilename(_)) if *p == unnamed));
        assert!(matches!(batch.skipped[1], (ref p, Error::DecodeFailure { .. }) if *p == corrupt));
    }

    #[test]
    fn sample_pairs_reference_temperature_with_mean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib_1500.png");
        write_wire(&path, 150);

        let reference = ReferenceCurve::default();
        let sample = sample_from_path(&path, &reference, &CalibrationOptions::default()).unwrap();
        assert_eq!(sample.current, 1.5);
        assert_relative_eq!(sample.reference_temperature, 2177.41527262, epsilon = 1e-6);

        let mut batch = SampleBatch::default();
        batch.push(&path, Ok(sample.clone()));
        let (means, temps) = batch.fit_input();
        assert_eq!(means, vec![150.]);
        assert_eq!(temps, vec![sample.reference_temperature]);
    }

    #[test]
    fn fit_requires_enough_samples() {
        let mut batch = SampleBatch::default();
        for i in 0..3 {
            batch.push(
                Path::new("x"),
                Ok(BrightnessSample {
                    path: PathBuf::from("x"),
                    current: 1. + i as f64,
                    reference_temperature: 1000. + 100. * i as f64,
                    mean: 50. + 10. * i as f64,
                    std: 0.,
                }),
            );
        }
        assert!(matches!(
            batch.fit(DEFAULT_DEGREE),
            Err(Error::InsufficientData { needed: 6, found: 3, .. })
        ));
        let line = batch.fit(1).unwrap();
        assert_relative_eq!(line.eval(60.), 1100., epsilon = 1e-9);
    }
}
