use std::path::PathBuf;

/// Errors produced by the graduation pipeline.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("no current value (4 digits, mA) in file name `{0}`")]
    InvalidFilename(String),

    #[error("insufficient data for {what}: need {needed}, have {found}")]
    InsufficientData {
        what: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("could not decode image {}: {source}", .path.display())]
    DecodeFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid graduation file {}: {reason}", .path.display())]
    CorruptGraduation { path: PathBuf, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("numerical failure: {0}")]
    Numerical(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
