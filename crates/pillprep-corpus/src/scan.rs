use crate::annotation::{image_stem, AnnotationIndex};
use crate::error::{StageError, StageResult};
use crate::fsutil::list_files;
use crate::layout::IMAGE_EXT;
use log::warn;
use pillprep_core::class_key::ClassKeyExtractor;
use pillprep_core::model::ImageRecord;
use pillprep_core::report::Warning;
use pillprep_core::sample::{Keyed, PoolItem};
use std::fs;
use std::path::{Path, PathBuf};

/// A training image together with its annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainPair {
    pub image: ImageRecord,
    pub annotation: PathBuf,
}

impl Keyed for TrainPair {
    fn class_key(&self) -> &str {
        &self.image.class_key
    }
}

impl PoolItem for TrainPair {
    fn source_path(&self) -> &Path {
        &self.image.path
    }

    fn quality_signal(&self) -> u64 {
        self.image.byte_size
    }
}

/// A test image; test images carry no annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestImage {
    pub image: ImageRecord,
}

impl Keyed for TestImage {
    fn class_key(&self) -> &str {
        &self.image.class_key
    }
}

impl PoolItem for TestImage {
    fn source_path(&self) -> &Path {
        &self.image.path
    }

    fn quality_signal(&self) -> u64 {
        self.image.byte_size
    }
}

#[derive(Debug, Clone)]
pub struct Scan<T> {
    pub items: Vec<T>,
    pub warnings: Vec<Warning>,
}

impl<T> Default for Scan<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Describes one image file. Dimensions come from the image header only.
pub fn image_record(path: &Path, extractor: &dyn ClassKeyExtractor) -> StageResult<ImageRecord> {
    let (width, height) = image::image_dimensions(path).map_err(|e| StageError::image(path, e))?;
    let byte_size = fs::metadata(path).map_err(|e| StageError::io(path, e))?.len();
    let id = image_stem(path);
    Ok(ImageRecord {
        class_key: extractor.class_key(&id),
        id,
        path: path.to_path_buf(),
        width,
        height,
        byte_size,
    })
}

fn scan_images(dir: &Path, extractor: &dyn ClassKeyExtractor) -> StageResult<Scan<ImageRecord>> {
    let mut scan = Scan::default();
    for path in list_files(dir, IMAGE_EXT)? {
        match image_record(&path, extractor) {
            Ok(record) => scan.items.push(record),
            Err(err) => {
                warn!("skipping unreadable image {path:?}: {err}");
                scan.warnings
                    .push(Warning::new("unreadable_image", err.to_string()));
            }
        }
    }
    Ok(scan)
}

/// Training images that have an annotation file. Images without one are
/// reported as warnings and left out of the pool.
pub fn scan_train_pairs(
    images_dir: &Path,
    annotations: &AnnotationIndex,
    extractor: &dyn ClassKeyExtractor,
) -> StageResult<Scan<TrainPair>> {
    let images = scan_images(images_dir, extractor)?;
    let mut scan = Scan {
        items: Vec::with_capacity(images.items.len()),
        warnings: images.warnings,
    };
    for image in images.items {
        match annotations.find(&image.id) {
            Some(annotation) => scan.items.push(TrainPair {
                annotation: annotation.to_path_buf(),
                image,
            }),
            None => scan.warnings.push(Warning::new(
                "missing_annotation",
                format!("no annotation for {:?}", image.path),
            )),
        }
    }
    Ok(scan)
}

pub fn scan_test_images(
    images_dir: &Path,
    extractor: &dyn ClassKeyExtractor,
) -> StageResult<Scan<TestImage>> {
    let images = scan_images(images_dir, extractor)?;
    Ok(Scan {
        items: images.items.into_iter().map(|image| TestImage { image }).collect(),
        warnings: images.warnings,
    })
}
