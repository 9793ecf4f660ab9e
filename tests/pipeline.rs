use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use image::{GrayImage, Luma};
use pyrometry::{
    apply_graduation, graduation, CalibrationOptions, Error, GraduationStore, GrayscaleImage,
    MapOptions, ReferenceCurve, ReferenceTemperature, SampleBatch,
};

/// A wire of constant brightness down column `wid / 2`.
fn write_wire(path: &Path, wid: u32, ht: u32, peak: u8) {
    GrayImage::from_fn(wid, ht, |x, _| {
        if x == wid / 2 {
            Luma([peak])
        } else {
            Luma([10])
        }
    })
    .save(path)
    .unwrap();
}

/// Brightness grows linearly with current, so the cubic
/// reference curve is exactly representable by a quintic.
fn peak_for(milliamps: u32) -> u8 {
    (60 + (milliamps - 1000) / 10) as u8
}

fn calibration_dir(dir: &Path) -> Vec<PathBuf> {
    let mut paths = vec![];
    for ma in (1000..=1600).step_by(100) {
        let path = dir.join(format!("wire_{}.png", ma));
        write_wire(&path, 15, 40, peak_for(ma));
        paths.push(path);
    }
    let unlabeled = dir.join("wire_old.png");
    write_wire(&unlabeled, 15, 40, 200);
    paths.push(unlabeled);
    paths
}

#[test]
fn graduate_save_load_apply() {
    let dir = tempfile::tempdir().unwrap();
    let paths = calibration_dir(dir.path());
    let reference = ReferenceCurve::default();
    let options = CalibrationOptions::default();

    let batch = SampleBatch::collect(paths.iter().map(|p| p.as_path()), &reference, &options);
    assert_eq!(batch.samples.len(), 7);
    assert_eq!(batch.skipped.len(), 1);
    assert!(matches!(batch.skipped[0].1, Error::InvalidFilename(_)));

    // the 1.5 A image contributes exactly one fit row
    let at_1500 = batch
        .samples
        .iter()
        .find(|s| s.path.ends_with("wire_1500.png"))
        .unwrap();
    assert_eq!(at_1500.current, 1.5);
    assert_eq!(at_1500.reference_temperature, reference.temperature(1.5));
    assert_relative_eq!(at_1500.reference_temperature, 2177.4152726175, epsilon = 1e-9);
    assert_eq!(at_1500.mean, peak_for(1500) as f64);
    let (means, temperatures) = batch.fit_input();
    assert!(means
        .iter()
        .zip(temperatures.iter())
        .any(|(&m, &t)| m == at_1500.mean && t == at_1500.reference_temperature));

    let fitted = batch.fit(options.degree).unwrap();
    assert_eq!(fitted.degree(), 5);

    let store = GraduationStore::new(dir.path());
    let saved = store.save("wire", &fitted).unwrap();
    let bytes = std::fs::read(&saved).unwrap();
    assert!(matches!(
        store.save("wire", &fitted),
        Err(Error::AlreadyExists(_))
    ));
    assert_eq!(std::fs::read(&saved).unwrap(), bytes);

    let loaded = graduation::load(&saved).unwrap();
    assert_eq!(loaded, fitted);

    // target: same wire geometry at 1.4 A
    let target = dir.path().join("target.png");
    write_wire(&target, 9, 9, peak_for(1400));
    let image = GrayscaleImage::load(&target, options.threshold).unwrap();
    let map = apply_graduation(&image, &loaded, &MapOptions::default());
    assert_eq!(map.dim(), (9, 9));
    assert_eq!(map.background_brightness(), peak_for(1400) as f64);
    let expected = reference.temperature(1.4);
    for &t in map.values().iter() {
        assert_relative_eq!(t, expected, max_relative = 1e-6);
    }

    let again = apply_graduation(&image, &loaded, &MapOptions::default());
    assert_eq!(again, map);
}

#[test]
fn too_few_calibration_images_fail_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = vec![];
    for ma in [1000u32, 1200, 1400].iter() {
        let path = dir.path().join(format!("wire_{}.png", ma));
        write_wire(&path, 15, 40, peak_for(*ma));
        paths.push(path);
    }

    let batch = SampleBatch::collect(
        paths.iter().map(|p| p.as_path()),
        &ReferenceCurve::default(),
        &CalibrationOptions::default(),
    );
    assert_eq!(batch.samples.len(), 3);
    assert!(matches!(
        batch.fit(5),
        Err(Error::InsufficientData { needed: 6, found: 3, .. })
    ));

    let store = GraduationStore::new(dir.path());
    assert!(!store.exists("wire"));
}
