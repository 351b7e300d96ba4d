#![allow(dead_code)]

use image::{Rgb, RgbImage};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

pub fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgb([(x % 251) as u8, (y % 251) as u8, 90]);
    }
    img.save(path).unwrap();
}

pub fn stem(code: &str, i: usize) -> String {
    format!("K-{code}-010221_0_2_0_2_70_000_{i:03}")
}

/// Writes `train_annotations/<code>_json/K-<code>/<stem>.json` with one box and
/// an extra field that must survive rewrites.
pub fn write_annotation(root: &Path, stem: &str, width: u32, height: u32, bbox: [f64; 4]) -> PathBuf {
    let code = stem.split('-').nth(1).unwrap();
    let path = root
        .join("train_annotations")
        .join(format!("{code}_json"))
        .join(format!("K-{code}"))
        .join(format!("{stem}.json"));
    let doc = json!({
        "images": [{
            "id": 1,
            "file_name": format!("{stem}.png"),
            "width": width,
            "height": height,
            "dl_name": "pill"
        }],
        "annotations": [{
            "image_id": 1,
            "bbox": bbox,
            "category_id": 1,
            "area": bbox[2] * bbox[3]
        }],
        "categories": [{"id": 1, "name": "Drug"}]
    });
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    path
}

/// A small corpus: `counts[i]` annotated train images for class `code_i`,
/// plus `test_count` test images. Images are `width × height`.
pub fn build_corpus(root: &Path, classes: &[(&str, usize)], test_count: usize, width: u32, height: u32) {
    for (code, count) in classes {
        for i in 0..*count {
            let stem = stem(code, i);
            write_png(&root.join("train_images").join(format!("{stem}.png")), width, height);
            let bbox = [10.0, 20.0, (width / 2) as f64, (height / 2) as f64];
            write_annotation(root, &stem, width, height, bbox);
        }
    }
    for i in 0..test_count {
        write_png(
            &root.join("test_images").join(format!("K-999999-000000_test_{i:03}.png")),
            width,
            height,
        );
    }
}

pub fn count_files(dir: &Path, ext: &str) -> usize {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some(ext))
            .count(),
        Err(_) => 0,
    }
}
