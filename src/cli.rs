//! Helpers shared by the command line binary.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
pub use clap::{App, Arg, SubCommand};
use glob::{glob_with, MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
pub use inflector::Inflector;

use crate::error::Error;

/// File extensions treated as images, matched without
/// regard to case.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Images directly inside `dir`, sorted by path.
pub fn scan_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::ResourceNotFound(dir.to_path_buf()).into());
    }

    let mut opts = MatchOptions::new();
    opts.case_sensitive = false;
    let base = Pattern::escape(&dir.to_string_lossy());

    let mut paths = vec![];
    for ext in IMAGE_EXTENSIONS.iter() {
        for entry in glob_with(&format!("{}/*.{}", base, ext), opts)
            .with_context(|| format!("scanning {}", dir.display()))?
        {
            let path = entry?;
            if path.is_file() {
                paths.push(path);
            }
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

pub fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {wide_bar:cyan/blue} {pos:>7}/{len:7}"),
    );
    bar
}

/// Log to stderr at `info` (or `debug`); `RUST_LOG`
/// overrides either. Stdout is left for reports.
pub fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}
