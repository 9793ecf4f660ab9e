//! Single-channel intensity images with background
//! suppression.

use std::path::Path;

use image::ImageError;
use ndarray::Array2;

use crate::error::{Error, Result};

/// Intensities strictly below this are treated as
/// background.
pub const DEFAULT_THRESHOLD: u8 = 40;

/// An 8-bit grayscale image, stored row-major as
/// `(rows, columns)`.
///
/// Every intensity below the threshold the image was
/// built with is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayscaleImage {
    pixels: Array2<u8>,
}

impl GrayscaleImage {
    /// Build an image from raw intensities, zeroing every
    /// value below `threshold`.
    pub fn from_array(mut pixels: Array2<u8>, threshold: u8) -> Self {
        pixels.mapv_inplace(|v| if v < threshold { 0 } else { v });
        GrayscaleImage { pixels }
    }

    /// Decode the file at `path` to 8-bit luma and suppress
    /// noise below `threshold`.
    ///
    /// Colour images are converted with the `image` crate's
    /// luma weights; 16-bit images are scaled down to 8
    /// bits.
    pub fn load<P: AsRef<Path>>(path: P, threshold: u8) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ResourceNotFound(path.to_path_buf()));
        }

        let luma = image::open(path)
            .map_err(|e| match e {
                ImageError::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                    Error::ResourceNotFound(path.to_path_buf())
                }
                source => Error::DecodeFailure {
                    path: path.to_path_buf(),
                    source,
                },
            })?
            .to_luma8();

        let (width, height) = luma.dimensions();
        let pixels = Array2::from_shape_vec((height as usize, width as usize), luma.into_raw())
            .map_err(|_| Error::Numerical("decoded buffer does not match image dimensions"))?;

        Ok(Self::from_array(pixels, threshold))
    }

    pub fn pixels(&self) -> &Array2<u8> {
        &self.pixels
    }

    /// `(rows, columns)`
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn threshold_zeroes_background() {
        let img = GrayscaleImage::from_array(array![[10, 39, 40], [41, 255, 0]], 40);
        assert_eq!(img.pixels(), &array![[0, 0, 40], [41, 255, 0]]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = GrayscaleImage::load(dir.path().join("nope.png"), DEFAULT_THRESHOLD).unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
    }

    #[test]
    fn garbage_file_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = GrayscaleImage::load(&path, DEFAULT_THRESHOLD).unwrap_err();
        assert!(matches!(err, Error::DecodeFailure { .. }));
    }

    #[test]
    fn loads_png_as_rows_by_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wire.png");
        // 3 wide, 2 high
        let raw = vec![0u8, 200, 20, 50, 60, 70];
        image::GrayImage::from_raw(3, 2, raw).unwrap().save(&path).unwrap();

        let img = GrayscaleImage::load(&path, 40).unwrap();
        assert_eq!(img.dim(), (2, 3));
        assert_eq!(img.pixels(), &array![[0, 200, 0], [50, 60, 70]]);
    }
}
