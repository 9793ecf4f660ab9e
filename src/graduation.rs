//! Persistence of graduation polynomials.
//!
//! A graduation file holds the coefficients (highest
//! degree first) encoded with bincode: a little-endian
//! `u64` count followed by that many IEEE-754 doubles.
//! Files are written once; replacing one is always an
//! explicit request.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use bincode::{DefaultOptions, Options};
use log::{info, warn};

use crate::{
    error::{Error, Result},
    polynomial::Polynomial,
};

pub const GRADUATION_EXTENSION: &str = "grad";

fn encoding() -> impl Options {
    DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Write `graduation` to a new file at `path`.
///
/// Fails with [`Error::AlreadyExists`] and leaves the file
/// untouched if anything is already there.
pub fn save<P: AsRef<Path>>(path: P, graduation: &Polynomial) -> Result<()> {
    let path = path.as_ref();
    let bytes = encoding()
        .serialize(graduation.coefficients())
        .map_err(|e| Error::CorruptGraduation {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    write_new(path, |writer| writer.write_all(&bytes))
}

/// Create `path` (never replacing an existing file) and fill
/// it with `fill`. A failed fill removes the partial file.
fn write_new<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => Error::AlreadyExists(path.to_path_buf()),
            _ => e.into(),
        })?;

    let written = {
        let mut writer = BufWriter::new(file);
        fill(&mut writer).and_then(|_| writer.flush())
    };
    if let Err(e) = written {
        if let Err(rm) = fs::remove_file(path) {
            warn!("could not remove partial file {}: {}", path.display(), rm);
        }
        return Err(e.into());
    }
    Ok(())
}

/// Read a graduation written by [`save`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<Polynomial> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ResourceNotFound(path.to_path_buf()),
        _ => e.into(),
    })?;

    let corrupt = |reason: String| Error::CorruptGraduation {
        path: path.to_path_buf(),
        reason,
    };
    let coefficients: Vec<f64> = encoding()
        .deserialize(&bytes)
        .map_err(|e| corrupt(e.to_string()))?;
    if coefficients.is_empty() {
        return Err(corrupt("no coefficients".into()));
    }
    Polynomial::new(coefficients)
}

/// A directory of named graduations (`<dir>/<name>.grad`).
#[derive(Debug, Clone)]
pub struct GraduationStore {
    dir: PathBuf,
}

impl GraduationStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        GraduationStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, GRADUATION_EXTENSION))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    pub fn save(&self, name: &str, graduation: &Polynomial) -> Result<PathBuf> {
        let path = self.path_for(name);
        save(&path, graduation)?;
        info!("graduation file {} created", path.display());
        Ok(path)
    }

    /// Save, removing any previous graduation of the same
    /// name first.
    pub fn replace(&self, name: &str, graduation: &Polynomial) -> Result<PathBuf> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => info!("removed previous graduation {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.save(name, graduation)
    }

    pub fn load(&self, name: &str) -> Result<Polynomial> {
        load(self.path_for(name))
    }
}
