use crate::annotation::AnnotationFile;
use crate::error::StageResult;
use crate::fsutil::{glob_sorted, require_dir, write_file, StagingDir};
use crate::layout::{DatasetLayout, CLASSES_TXT, LABEL_EXT};
use log::{info, warn};
use pillprep_core::class_key::ClassKeyExtractor;
use pillprep_core::convert::{build_vocabulary, convert_to_yolo, ClassVocabulary};
use pillprep_core::model::{file_stem, render_label};
use pillprep_core::report::Warning;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub converted: usize,
    pub vocabulary: ClassVocabulary,
    pub classes_file: PathBuf,
    /// Labels written with class id 0 because their key had no id.
    pub class_fallbacks: usize,
    pub warnings: Vec<Warning>,
}

impl ConversionSummary {
    pub fn total_classes(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Converts every annotation under `<input>/train_annotations` into one YOLO
/// label per image in `output`, plus `classes.txt`. Class ids follow the
/// sorted class keys of all image file names.
pub fn convert_annotations(
    input: &Path,
    output: &Path,
    extractor: &dyn ClassKeyExtractor,
) -> StageResult<ConversionSummary> {
    let layout = DatasetLayout::new(input);
    let annotations_dir = layout.train_annotations();
    require_dir(&annotations_dir)?;

    let files = glob_sorted(&annotations_dir, "*/*/*.json")?;
    info!("converting {} annotation files -> {output:?}", files.len());

    let mut warnings = Vec::new();
    let mut loaded = Vec::with_capacity(files.len());
    for path in &files {
        match AnnotationFile::load(path) {
            Ok(file) => loaded.push(file),
            Err(err) => {
                warn!("skipping {path:?}: {err}");
                warnings.push(Warning::new("invalid_annotation", err.to_string()));
            }
        }
    }

    let vocabulary = build_vocabulary(
        loaded
            .iter()
            .flat_map(|file| file.images.iter())
            .map(|img| extractor.class_key(file_stem(&img.file_name))),
    );
    info!("found {} classes", vocabulary.len());

    let staging = StagingDir::new(output)?;
    write_file(&staging.path().join(CLASSES_TXT), vocabulary.to_classes_txt())?;

    let mut converted = 0;
    let mut class_fallbacks = 0;
    for file in &loaded {
        for record in file.records() {
            let key = extractor.class_key(record.stem());
            let label = match convert_to_yolo(&record, &key, &vocabulary) {
                Ok(label) => label,
                Err(err) => {
                    warn!("skipping {}: {err}", record.file_name);
                    warnings.push(Warning::new(
                        "invalid_image_size",
                        format!("{}: {err}", record.file_name),
                    ));
                    continue;
                }
            };
            if label.class_fallback {
                class_fallbacks += 1;
                warnings.push(Warning::new(
                    "unknown_class",
                    format!("{}: class key {key:?} not in vocabulary, using id 0", record.file_name),
                ));
            }
            let label_path = staging
                .path()
                .join(format!("{}.{LABEL_EXT}", record.stem()));
            write_file(&label_path, render_label(&label.lines))?;
            converted += 1;
        }
    }

    let output = staging.commit()?;
    info!("conversion complete: {converted} labels written");
    Ok(ConversionSummary {
        classes_file: output.join(CLASSES_TXT),
        output,
        converted,
        vocabulary,
        class_fallbacks,
        warnings,
    })
}
