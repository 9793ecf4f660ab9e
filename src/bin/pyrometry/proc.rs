use std::{
    fs::{self, File},
    io::{BufWriter, Cursor},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use byteordered::ByteOrdered;
use image::tiff::TiffEncoder;
use itertools::Itertools;
use log::{info, warn};
use serde_derive::*;

use pyrometry::{
    apply_graduation,
    calibration::sample_from_path,
    cli::{progress_bar, scan_images},
    temperature::MapSummary,
    BrightnessSample, CalibrationOptions, GraduationStore, GrayscaleImage, MapOptions, Polynomial, ReferenceCurve,
    SampleBatch, TemperatureMap,
};

use crate::args::{ApplyArgs, GradArgs};

fn print_report<T: serde::Serialize>(report: &T) -> Result<()> {
    serde_json::to_writer(std::io::stdout().lock(), report)?;
    println!();
    Ok(())
}

#[derive(Serialize, Debug)]
pub struct GradReport {
    graduation: Vec<f64>,
    samples: Vec<BrightnessSample>,
    skipped: Vec<PathBuf>,
}

pub fn run_grad(store: &GraduationStore, name: &str, args: &GradArgs) -> Result<()> {
    print_report(&grad(store, name, args)?)
}

/// Fit and store a graduation. An existing graduation is
/// only replaced with `--overwrite`, and only once the new
/// fit has succeeded.
pub fn grad(store: &GraduationStore, name: &str, args: &GradArgs) -> Result<GradReport> {
    let grad_path = store.path_for(name);
    if store.exists(name) && !args.overwrite {
        bail!(
            "graduation file {} already exists (pass --overwrite to replace it)",
            grad_path.display()
        );
    }

    let reference = match &args.reference {
        Some(path) => ReferenceCurve::from_json_path(path)
            .with_context(|| format!("loading reference curve {}", path.display()))?,
        None => ReferenceCurve::default(),
    };
    let options = CalibrationOptions {
        threshold: args.threshold,
        choose_percentage: args.choose_percentage,
        degree: args.degree,
    };

    let input_dir = args.input_dir.as_deref().unwrap_or_else(|| store.dir());
    let paths = scan_images(input_dir)?;

    let bar = progress_bar(paths.len());
    let mut batch = SampleBatch::default();
    for path in paths.iter() {
        batch.push(path, sample_from_path(path, &reference, &options));
        bar.inc(1);
    }
    bar.finish_and_clear();

    for sample in batch.samples.iter() {
        info!(
            "processed {}:\tcurrent={:.2}A\ttemperature={:.2}K\tmean={:.2}",
            sample.path.display(),
            sample.current,
            sample.reference_temperature,
            sample.mean
        );
    }
    if !batch.skipped.is_empty() {
        warn!(
            "{} of {} calibration images skipped",
            batch.skipped.len(),
            paths.len()
        );
    }

    let graduation = batch
        .fit(options.degree)
        .with_context(|| format!("fitting graduation from {}", input_dir.display()))?;
    eprintln!("Graduation: T = {}", graduation);

    let saved = if args.overwrite {
        store.replace(name, &graduation)
    } else {
        store.save(name, &graduation)
    }
    .with_context(|| format!("saving graduation {}", grad_path.display()))?;
    eprintln!("Graduation file {} created", saved.display());

    Ok(GradReport {
        graduation: graduation.coefficients().to_vec(),
        samples: batch.samples,
        skipped: batch.skipped.into_iter().map(|(path, _)| path).collect(),
    })
}

/// Linear map from temperature to the 16-bit output range.
pub struct Scale {
    pub coeffs: [f64; 2],
}

impl Scale {
    pub fn new(min: f64, max: f64) -> Self {
        let factor = if max > min && (max - min).is_finite() {
            u16::MAX as f64 / (max - min)
        } else {
            0.
        };
        Scale {
            coeffs: [-min * factor, factor],
        }
    }

    pub fn transform(&self, val: f64) -> u16 {
        let tval = self.coeffs[0] + self.coeffs[1] * val;
        tval.max(0.).min(u16::MAX as f64) as u16
    }
}

pub fn write_temperature_tiff(map: &TemperatureMap, scale: &Scale, path: &Path) -> Result<()> {
    let (ht, wid) = map.dim();
    let mut image_buffer = {
        let vec = Vec::with_capacity(2 * ht * wid);
        ByteOrdered::native(Cursor::new(vec))
    };
    for &t in map.values().iter() {
        image_buffer.write_u16(scale.transform(t))?;
    }

    let image_writer = BufWriter::new(File::create(path)?);
    TiffEncoder::new(image_writer).encode(
        &image_buffer.into_inner().into_inner(),
        wid as u32,
        ht as u32,
        image::ColorType::L16,
    )?;
    Ok(())
}

#[derive(Serialize, Debug)]
pub struct ImageReport {
    path: PathBuf,
    output: PathBuf,
    width: usize,
    height: usize,
    background_brightness: f64,
    temperature: MapSummary,
    /// `value = scale[0] + scale[1] * temperature`
    scale: [f64; 2],
}

/// `processed_<stem>.tif` in `output_dir`. Inputs sharing a
/// stem keep their extension in the name as well
/// (`processed_<stem>_<ext>.tif`).
fn output_paths(paths: &[PathBuf], output_dir: &Path) -> Vec<PathBuf> {
    let stem = |p: &Path| {
        p.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let counts = paths.iter().map(|p| stem(p.as_path())).counts();

    paths
        .iter()
        .map(|p| {
            let s = stem(p.as_path());
            let name = if counts[&s] > 1 {
                let ext = p
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("processed_{}_{}.tif", s, ext)
            } else {
                format!("processed_{}.tif", s)
            };
            output_dir.join(name)
        })
        .collect()
}

fn process_image(
    path: &Path,
    output: &Path,
    graduation: &Polynomial,
    args: &ApplyArgs,
    options: &MapOptions,
) -> Result<ImageReport> {
    let image = GrayscaleImage::load(path, args.threshold)?;
    let map = apply_graduation(&image, graduation, options);
    let summary = map.summary();

    let scale = Scale::new(
        args.min.unwrap_or(summary.min),
        args.max.unwrap_or(summary.max),
    );
    write_temperature_tiff(&map, &scale, output)?;
    eprintln!(
        "{}: value = {} + {} * T",
        output.display(),
        scale.coeffs[0],
        scale.coeffs[1]
    );

    let (height, width) = map.dim();
    Ok(ImageReport {
        path: path.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        background_brightness: map.background_brightness(),
        temperature: summary,
        scale: scale.coeffs,
    })
}

#[derive(Serialize, Debug)]
pub struct ApplyReport {
    graduation: Vec<f64>,
    options: MapOptions,
    images: Vec<ImageReport>,
    failed: Vec<PathBuf>,
}

pub fn run_apply(store: &GraduationStore, name: &str, args: &ApplyArgs) -> Result<()> {
    print_report(&apply(store, name, args)?)
}

/// Convert every image of the input directory. An image that
/// fails is logged and listed in the report; the others are
/// still written.
pub fn apply(store: &GraduationStore, name: &str, args: &ApplyArgs) -> Result<ApplyReport> {
    let graduation = store
        .load(name)
        .with_context(|| format!("loading graduation {}", store.path_for(name).display()))?;
    info!("graduation: T = {}", graduation);

    let paths = scan_images(&args.input_dir)?;
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;
    let outputs = output_paths(&paths, &args.output_dir);

    let options = MapOptions {
        aggregation: args.aggregation,
        shift: args.shift,
    };

    let bar = progress_bar(paths.len());
    let mut images = vec![];
    let mut failed = vec![];
    for (path, output) in paths.iter().zip(outputs.iter()) {
        match process_image(path, output, &graduation, args, &options) {
            Ok(report) => {
                info!("processed {} -> {}", path.display(), output.display());
                images.push(report);
            }
            Err(e) => {
                warn!("skipping {}: {:#}", path.display(), e);
                failed.push(path.clone());
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    eprintln!("Processed {} images ({} failed)", images.len(), failed.len());
    Ok(ApplyReport {
        graduation: graduation.coefficients().to_vec(),
        options,
        images,
        failed,
    })
}
