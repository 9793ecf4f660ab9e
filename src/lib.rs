//! Optical pyrometry from photographs of a glowing wire.
//!
//! This crate provides two functionalities:
//!
//! 1. Build a [graduation](graduation) — a polynomial
//! mapping image brightness to temperature — from
//! calibration images of a vertical wire heated by known
//! currents.
//!
//! 2. Apply a graduation to new images, producing a
//! per-pixel [temperature map](temperature::TemperatureMap).
//!
//! # Usage
//!
//! ## Building a graduation
//!
//! Each calibration image yields one
//! [`BrightnessSample`]: the wire's [peak
//! brightness](brightness::wire_brightness) paired with the
//! [reference temperature](reference::ReferenceTemperature)
//! of the current encoded in the file name.
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use std::path::Path;
//! use pyrometry::{CalibrationOptions, GraduationStore, ReferenceCurve, SampleBatch};
//!
//! let paths = [Path::new("calib/wire_1500.png"), Path::new("calib/wire_1800.png")];
//! let options = CalibrationOptions::default();
//! let batch = SampleBatch::collect(paths.iter().copied(), &ReferenceCurve::default(), &options);
//! let graduation = batch.fit(options.degree)?;
//! GraduationStore::new("GRADUATION").save("wire", &graduation)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Applying a graduation
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use pyrometry::{apply_graduation, GrayscaleImage, GraduationStore, MapOptions};
//!
//! let graduation = GraduationStore::new("GRADUATION").load("wire")?;
//! let image = GrayscaleImage::load("target.png", pyrometry::image::DEFAULT_THRESHOLD)?;
//! let map = apply_graduation(&image, &graduation, &MapOptions::default());
//! println!("{:?}", map.summary());
//! # Ok(())
//! # }
//! ```

pub mod brightness;
pub mod calibration;
mod error;
pub mod graduation;
pub mod image;
pub mod polynomial;
pub mod reference;
pub mod temperature;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::calibration::{BrightnessSample, CalibrationOptions, SampleBatch};
pub use crate::error::{Error, Result};
pub use crate::graduation::GraduationStore;
pub use crate::image::GrayscaleImage;
pub use crate::polynomial::{GraduationPolynomial, Polynomial};
pub use crate::reference::{ReferenceCurve, ReferenceTemperature};
pub use crate::temperature::{apply_graduation, Aggregation, MapOptions, TemperatureMap};
