use crate::annotation::{image_stem, AnnotationFile, AnnotationIndex};
use crate::error::{StageError, StageResult};
use crate::fsutil::list_files;
use crate::layout::{DatasetLayout, IMAGE_EXT};
use image::{ColorType, ImageDecoder, ImageReader};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SHOWN_ISSUES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub valid: usize,
    pub total: usize,
    pub issues: Vec<String>,
}

impl CheckSummary {
    pub fn valid_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64
        }
    }

    fn log(&self, what: &str) {
        info!("{what}: {}/{} valid", self.valid, self.total);
        for issue in self.issues.iter().take(SHOWN_ISSUES) {
            warn!("  {issue}");
        }
        if self.issues.len() > SHOWN_ISSUES {
            warn!("  ... and {} more", self.issues.len() - SHOWN_ISSUES);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub images: CheckSummary,
    pub annotations: CheckSummary,
}

impl ValidationSummary {
    pub fn is_clean(&self) -> bool {
        self.images.issues.is_empty() && self.annotations.issues.is_empty()
    }
}

fn header(path: &Path) -> StageResult<(u32, u32, ColorType)> {
    let decoder = ImageReader::open(path)
        .map_err(|e| StageError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| StageError::io(path, e))?
        .into_decoder()
        .map_err(|e| StageError::image(path, e))?;
    let (w, h) = decoder.dimensions();
    Ok((w, h, decoder.color_type()))
}

/// Checks every train and test image: readable header, both sides at least
/// `min_size`, and 8-bit RGB or grayscale pixels.
pub fn validate_images(dataset: &Path, min_size: u32) -> StageResult<CheckSummary> {
    let layout = DatasetLayout::new(dataset);
    let mut images = list_files(&layout.train_images(), IMAGE_EXT)?;
    images.extend(list_files(&layout.test_images(), IMAGE_EXT)?);

    let mut summary = CheckSummary {
        total: images.len(),
        ..CheckSummary::default()
    };
    for path in &images {
        match header(path) {
            Ok((w, h, _)) if w < min_size || h < min_size => {
                summary
                    .issues
                    .push(format!("small image: {} ({w}x{h})", path.display()));
            }
            Ok((_, _, color)) if !matches!(color, ColorType::Rgb8 | ColorType::L8) => {
                summary
                    .issues
                    .push(format!("unsupported pixel format: {} ({color:?})", path.display()));
            }
            Ok(_) => summary.valid += 1,
            Err(err) => summary.issues.push(format!("corrupted image: {err}")),
        }
    }
    Ok(summary)
}

/// Every training image needs an annotation file that parses.
pub fn validate_annotations(dataset: &Path) -> StageResult<CheckSummary> {
    let layout = DatasetLayout::new(dataset);
    let index = AnnotationIndex::build(dataset)?;
    let images = list_files(&layout.train_images(), IMAGE_EXT)?;

    let mut summary = CheckSummary {
        total: images.len(),
        ..CheckSummary::default()
    };
    for path in &images {
        let stem = image_stem(path);
        let Some(annotation) = index.find(&stem) else {
            summary.issues.push(format!("missing annotation: {stem}"));
            continue;
        };
        match AnnotationFile::load(annotation) {
            Ok(_) => summary.valid += 1,
            Err(err) => summary.issues.push(format!("invalid annotation: {err}")),
        }
    }
    Ok(summary)
}

/// Runs both checks. Problems are reported, never raised.
pub fn validate_dataset(dataset: &Path, min_size: u32) -> StageResult<ValidationSummary> {
    info!("validating {dataset:?}");
    let summary = ValidationSummary {
        images: validate_images(dataset, min_size)?,
        annotations: validate_annotations(dataset)?,
    };
    summary.images.log("images");
    summary.annotations.log("annotations");
    Ok(summary)
}
