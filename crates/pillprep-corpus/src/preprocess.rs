use crate::annotation::{image_stem, AnnotationFile, AnnotationIndex};
use crate::error::{StageError, StageResult};
use crate::fsutil::{create_dir_all, list_files, require_dir, StagingDir};
use crate::layout::{DatasetLayout, IMAGE_EXT, TEST_IMAGES, TRAIN_ANNOTATIONS, TRAIN_IMAGES};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use log::{info, warn};
use pillprep_core::geom::{compute_resize_params, ResizeParams};
use pillprep_core::report::Warning;
use pillprep_core::{PrepError, PrepResult};
use std::path::{Path, PathBuf};

/// Letterboxes `img` onto a black `target × target` RGB canvas.
pub fn resize_image(img: &DynamicImage, target_size: u32) -> PrepResult<(RgbImage, ResizeParams)> {
    let rgb = img.to_rgb8();
    let params = compute_resize_params(rgb.width(), rgb.height(), target_size)?;
    let (new_w, new_h) = params.new_size;
    let resized = imageops::resize(&rgb, new_w, new_h, FilterType::Lanczos3);

    let mut canvas = RgbImage::new(target_size, target_size);
    let (pad_left, pad_top) = params.padding;
    imageops::replace(&mut canvas, &resized, pad_left.into(), pad_top.into());
    Ok((canvas, params))
}

/// Loads, letterboxes and saves one image as PNG.
pub fn process_image(input: &Path, output: &Path, target_size: u32) -> StageResult<ResizeParams> {
    let img = image::open(input).map_err(|e| StageError::image(input, e))?;
    let (canvas, params) = resize_image(&img, target_size)?;
    if let Some(parent) = output.parent() {
        create_dir_all(parent)?;
    }
    canvas
        .save_with_format(output, image::ImageFormat::Png)
        .map_err(|e| StageError::image(output, e))?;
    Ok(params)
}

#[derive(Debug, Clone)]
pub struct PreprocessSummary {
    pub output: PathBuf,
    /// Train images with a rewritten annotation plus test images.
    pub processed: usize,
    pub failed: usize,
    pub warnings: Vec<Warning>,
}

impl PreprocessSummary {
    pub fn success_rate(&self) -> f64 {
        let total = self.processed + self.failed;
        if total == 0 {
            0.0
        } else {
            self.processed as f64 / total as f64
        }
    }

    fn fail(&mut self, code: &str, message: String) {
        warn!("{message}");
        self.failed += 1;
        self.warnings.push(Warning::new(code, message));
    }
}

/// Letterboxes every train and test image of `input` into `output`, and
/// rewrites each train image's annotation, at the same relative path, to the
/// new pixel coordinates.
pub fn preprocess_dataset(input: &Path, output: &Path, target_size: u32) -> StageResult<PreprocessSummary> {
    if target_size == 0 {
        return Err(PrepError::config("target size must be positive").into());
    }
    let source = DatasetLayout::new(input);
    require_dir(&source.train_images())?;
    info!("preprocessing {input:?} -> {output:?} at {target_size}px");

    let index = AnnotationIndex::build(input)?;
    let staging = StagingDir::new(output)?;
    let staged = staging.path().to_path_buf();
    for dir in [TRAIN_IMAGES, TEST_IMAGES, TRAIN_ANNOTATIONS] {
        create_dir_all(&staged.join(dir))?;
    }

    let mut summary = PreprocessSummary {
        output: output.to_path_buf(),
        processed: 0,
        failed: 0,
        warnings: Vec::new(),
    };

    let train = list_files(&source.train_images(), IMAGE_EXT)?;
    info!("processing {} training images", train.len());
    for path in &train {
        let name = path.file_name().unwrap_or_default();
        let params = match process_image(path, &staged.join(TRAIN_IMAGES).join(name), target_size) {
            Ok(params) => params,
            Err(err) => {
                summary.fail("image_failed", format!("failed to process {path:?}: {err}"));
                continue;
            }
        };

        let stem = image_stem(path);
        let Some(annotation) = index.find(&stem) else {
            summary.warnings.push(Warning::new(
                "missing_annotation",
                format!("no annotation for {stem}"),
            ));
            continue;
        };
        let dst = staged.join(TRAIN_ANNOTATIONS).join(index.relative(annotation));
        let rewritten = AnnotationFile::load(annotation).and_then(|mut file| {
            file.remap(&params);
            file.save(&dst)
        });
        match rewritten {
            Ok(()) => summary.processed += 1,
            Err(err) => summary.fail(
                "annotation_failed",
                format!("failed to update annotation {annotation:?}: {err}"),
            ),
        }
    }

    let test = list_files(&source.test_images(), IMAGE_EXT)?;
    info!("processing {} test images", test.len());
    for path in &test {
        let name = path.file_name().unwrap_or_default();
        match process_image(path, &staged.join(TEST_IMAGES).join(name), target_size) {
            Ok(_) => summary.processed += 1,
            Err(err) => summary.fail("image_failed", format!("failed to process {path:?}: {err}")),
        }
    }

    summary.output = staging.commit()?;
    info!(
        "preprocessing complete: {} processed, {} failed",
        summary.processed, summary.failed
    );
    Ok(summary)
}
