use crate::annotation::AnnotationIndex;
use crate::error::StageResult;
use crate::fsutil::{copy_file, create_dir_all, glob_sorted, list_files, require_dir, StagingDir};
use crate::layout::{DatasetLayout, IMAGE_EXT, TEST_IMAGES, TRAIN_ANNOTATIONS, TRAIN_IMAGES};
use crate::scan::{scan_test_images, scan_train_pairs};
use log::info;
use pillprep_core::class_key::ClassKeyExtractor;
use pillprep_core::config::SampleRequest;
use pillprep_core::report::Warning;
use pillprep_core::sample::{select_sample, SamplingStrategy};
use rand::Rng;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SubsetSummary {
    pub output: PathBuf,
    pub train_images: usize,
    pub test_images: usize,
    pub annotations: usize,
    pub warnings: Vec<Warning>,
}

/// Draws a smaller dataset from the source corpus: sampled training pairs
/// (annotations keep their relative path) and randomly chosen test images.
///
/// The output directory is replaced as a whole, and only once everything has
/// been copied.
pub fn create_subset<R>(
    source: &Path,
    output: &Path,
    request: &SampleRequest,
    extractor: &dyn ClassKeyExtractor,
    rng: &mut R,
) -> StageResult<SubsetSummary>
where
    R: Rng + ?Sized,
{
    request.validate()?;
    let source = DatasetLayout::new(source);
    require_dir(&source.train_images())?;
    require_dir(&source.train_annotations())?;

    info!(
        "creating subset: {} train, {} test ({}) -> {output:?}",
        request.train_size, request.test_size, request.strategy
    );

    let index = AnnotationIndex::build(source.root())?;
    let train_pool = scan_train_pairs(&source.train_images(), &index, extractor)?;
    let test_pool = scan_test_images(&source.test_images(), extractor)?;
    let mut warnings = train_pool.warnings;
    warnings.extend(test_pool.warnings);

    let train = select_sample(&train_pool.items, request.train_size, request.strategy, rng);
    let test = select_sample(&test_pool.items, request.test_size, SamplingStrategy::Random, rng);

    let staging = StagingDir::new(output)?;
    let staged = staging.path();
    for dir in [TRAIN_IMAGES, TEST_IMAGES, TRAIN_ANNOTATIONS] {
        create_dir_all(&staged.join(dir))?;
    }

    for pair in &train {
        let name = pair.image.path.file_name().unwrap_or_default();
        copy_file(&pair.image.path, &staged.join(TRAIN_IMAGES).join(name))?;
        let rel = index.relative(&pair.annotation);
        copy_file(&pair.annotation, &staged.join(TRAIN_ANNOTATIONS).join(rel))?;
    }
    for item in &test {
        let name = item.image.path.file_name().unwrap_or_default();
        copy_file(&item.image.path, &staged.join(TEST_IMAGES).join(name))?;
    }

    let output = staging.commit()?;
    let layout = DatasetLayout::new(&output);
    let summary = SubsetSummary {
        train_images: list_files(&layout.train_images(), IMAGE_EXT)?.len(),
        test_images: list_files(&layout.test_images(), IMAGE_EXT)?.len(),
        annotations: glob_sorted(&layout.train_annotations(), "*/*/*.json")?.len(),
        output,
        warnings,
    };
    info!(
        "subset ready: {} train, {} test, {} annotations",
        summary.train_images, summary.test_images, summary.annotations
    );
    Ok(summary)
}
