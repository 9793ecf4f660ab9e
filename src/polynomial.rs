//! Dense polynomials and their least-squares fit.
//!
//! Coefficients are kept highest degree first, i.e.
//! `[a_n, ..., a_1, a_0]` for `a_n x^n + ... + a_0`. This
//! is also the order they are persisted in by
//! [`graduation`][crate::graduation].

use std::fmt;

use log::warn;
use nalgebra::{DMatrix, DVector};
use serde_derive::*;

use crate::error::{Error, Result};

/// Degree of a freshly fitted graduation.
pub const DEFAULT_DEGREE: usize = 5;

/// A polynomial in one variable with `f64` coefficients.
///
/// A graduation (brightness to temperature) is one of
/// these; see [`GraduationPolynomial`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Polynomial {
    pub(crate) coefficients: Vec<f64>,
}

pub type GraduationPolynomial = Polynomial;

impl Polynomial {
    /// Build from coefficients, highest degree first. At
    /// least one coefficient is required.
    pub fn new(coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(Error::InvalidParameter(
                "a polynomial needs at least one coefficient".into(),
            ));
        }
        Ok(Polynomial { coefficients })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Horner evaluation.
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0., |acc, c| acc * x + c)
    }

    /// Ordinary least-squares fit of a `degree` polynomial
    /// through `(x, y)`.
    ///
    /// The Vandermonde columns are scaled to unit norm before
    /// an SVD solve, and singular values below
    /// `len(x) * eps` (relative to the largest) are dropped.
    /// Fewer than `degree + 1` distinct `x` values leave the
    /// system rank deficient, which is an
    /// [`Error::InsufficientData`].
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::InvalidParameter(format!(
                "x and y differ in length ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.len() <= degree {
            return Err(Error::InsufficientData {
                what: "polynomial fit",
                needed: degree + 1,
                found: x.len(),
            });
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter(
                "fit input contains non-finite values".into(),
            ));
        }

        let rows = x.len();
        let cols = degree + 1;
        let mut lhs = DMatrix::<f64>::from_fn(rows, cols, |r, c| x[r].powi((degree - c) as i32));
        let rhs = DVector::<f64>::from_column_slice(y);

        let mut scale = vec![1.; cols];
        for (c, s) in scale.iter_mut().enumerate() {
            let norm = lhs.column(c).norm();
            if norm > 0. {
                *s = norm;
                lhs.column_mut(c).unscale_mut(norm);
            }
        }

        let svd = lhs.svd(true, true);
        let max_sv = svd.singular_values.max();
        let cutoff = rows as f64 * f64::EPSILON * max_sv;
        let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();
        if rank < cols {
            warn!("polynomial fit is rank deficient (rank {} of {})", rank, cols);
            return Err(Error::InsufficientData {
                what: "polynomial fit (distinct brightness levels)",
                needed: cols,
                found: rank,
            });
        }

        let solution = svd.solve(&rhs, cutoff).map_err(Error::Numerical)?;
        let coefficients = solution
            .iter()
            .zip(scale.iter())
            .map(|(c, s)| c / s)
            .collect();

        Polynomial::new(coefficients)
    }
}

impl std::convert::TryFrom<Vec<f64>> for Polynomial {
    type Error = Error;

    fn try_from(coefficients: Vec<f64>) -> Result<Self> {
        Polynomial::new(coefficients)
    }
}

impl From<Polynomial> for Vec<f64> {
    fn from(p: Polynomial) -> Self {
        p.coefficients
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let degree = self.degree();
        for (i, c) in self.coefficients.iter().enumerate() {
            let power = degree - i;
            if i == 0 {
                write!(f, "{}", c)?;
            } else if c.is_sign_negative() {
                write!(f, " - {}", -c)?;
            } else {
                write!(f, " + {}", c)?;
            }
            match power {
                0 => {}
                1 => write!(f, " x")?,
                _ => write!(f, " x^{}", power)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn eval_is_highest_degree_first() {
        let p = Polynomial::new(vec![2., -3., 1.]).unwrap();
        assert_eq!(p.degree(), 2);
        assert_eq!(p.eval(0.), 1.);
        assert_eq!(p.eval(2.), 3.);
    }

    #[test]
    fn empty_polynomial_is_rejected() {
        assert!(matches!(
            Polynomial::new(vec![]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn fit_recovers_exact_quintic() {
        let truth = Polynomial::new(vec![1e-9, -2e-7, 3e-4, -0.05, 12., 800.]).unwrap();
        let x: Vec<f64> = (0..12).map(|i| 20. + 18. * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| truth.eval(v)).collect();

        let fitted = Polynomial::fit(&x, &y, DEFAULT_DEGREE).unwrap();
        assert_eq!(fitted.degree(), 5);
        for &v in x.iter() {
            assert_relative_eq!(fitted.eval(v), truth.eval(v), max_relative = 1e-6);
        }
    }

    #[test]
    fn fit_line_through_noisy_points() {
        let x = [0., 1., 2., 3.];
        let y = [1., 3.1, 4.9, 7.];
        let p = Polynomial::fit(&x, &y, 1).unwrap();
        assert_relative_eq!(p.coefficients()[0], 1.98, epsilon = 1e-10);
        assert_relative_eq!(p.coefficients()[1], 1.03, epsilon = 1e-10);
    }

    #[test]
    fn fit_needs_more_points_than_degree() {
        let err = Polynomial::fit(&[1., 2., 3., 4., 5.], &[1., 2., 3., 4., 5.], 5).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData {
                needed: 6,
                found: 5,
                ..
            }
        ));
    }

    #[test]
    fn saturated_brightness_cannot_be_fit() {
        let x = [255.; 6];
        let y = [1500., 1600., 1700., 1800., 1900., 2000.];
        let err = Polynomial::fit(&x, &y, 5).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData { needed: 6, found, .. } if found < 6
        ));
    }

    #[test]
    fn too_few_distinct_levels_cannot_be_fit() {
        // twelve samples, but only three brightness levels
        let x: Vec<f64> = (0..12).map(|i| [100., 150., 200.][i % 3]).collect();
        let y: Vec<f64> = x.iter().map(|v| 10. * v + 300.).collect();
        let err = Polynomial::fit(&x, &y, 5).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData { needed: 6, found, .. } if found < 6
        ));

        // a line through the same three levels is well posed
        let line = Polynomial::fit(&x, &y, 1).unwrap();
        assert_relative_eq!(line.eval(120.), 1500., epsilon = 1e-8);
    }

    #[test]
    fn fit_rejects_mismatched_lengths() {
        let err = Polynomial::fit(&[1., 2., 3.], &[1., 2.], 1).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn display_lists_terms() {
        let p = Polynomial::new(vec![2., -3., 1.]).unwrap();
        assert_eq!(p.to_string(), "2 x^2 - 3 x + 1");
    }
}
