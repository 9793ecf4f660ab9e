//! Reference temperatures of the calibration wire.
//!
//! The temperature of the wire at a known heating current
//! is an apparatus property measured offline; the pipeline
//! only consumes it through [`ReferenceTemperature`].

use std::{fs::File, io::BufReader, path::Path};

use serde_derive::*;

use crate::{
    error::{Error, Result},
    polynomial::Polynomial,
};

/// Current-to-temperature cubic (highest degree first)
/// measured offline for the laboratory wire.
pub const WIRE_CUBIC: [f64; 4] = [108.0958765, -511.9765339, 1617.95649045, 537.60415503];

/// Maps heating current (A) to wire temperature (K).
pub trait ReferenceTemperature {
    fn temperature(&self, current: f64) -> f64;
}

impl<F> ReferenceTemperature for F
where
    F: Fn(f64) -> f64,
{
    fn temperature(&self, current: f64) -> f64 {
        self(current)
    }
}

/// Current-to-temperature curve given as a polynomial.
///
/// Stored as JSON as `{"coefficients": [a_n, ..., a_0]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCurve {
    coefficients: Polynomial,
}

impl ReferenceCurve {
    pub fn new(coefficients: Polynomial) -> Self {
        ReferenceCurve { coefficients }
    }

    pub fn polynomial(&self) -> &Polynomial {
        &self.coefficients
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ResourceNotFound(path.to_path_buf()),
            _ => e.into(),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::InvalidParameter(format!(
                "reference curve {}: {}",
                path.display(),
                e
            ))
        })
    }
}

impl Default for ReferenceCurve {
    /// The [`WIRE_CUBIC`] curve.
    fn default() -> Self {
        ReferenceCurve {
            coefficients: Polynomial {
                coefficients: WIRE_CUBIC.to_vec(),
            },
        }
    }
}

impl ReferenceTemperature for ReferenceCurve {
    fn temperature(&self, current: f64) -> f64 {
        self.coefficients.eval(current)
    }
}
