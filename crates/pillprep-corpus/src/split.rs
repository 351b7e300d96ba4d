use crate::annotation::image_stem;
use crate::error::{StageError, StageResult};
use crate::fsutil::{absolute, copy_file, create_dir_all, list_files, read_to_string, require_dir, write_file, StagingDir};
use crate::layout::{DatasetLayout, CLASSES_TXT, DATASET_YAML, IMAGE_EXT, LABEL_EXT};
use log::{info, warn};
use pillprep_core::class_key::ClassKeyExtractor;
use pillprep_core::convert::ClassVocabulary;
use pillprep_core::model::Split;
use pillprep_core::report::Warning;
use pillprep_core::sample::Keyed;
use pillprep_core::split::{stratified_split, SplitRatios};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const FALLBACK_CLASS_NAME: &str = "pill";

/// YOLO training config written next to `images/` and `labels/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetYaml {
    pub path: String,
    pub train: String,
    pub val: String,
    pub test: String,
    pub nc: usize,
    pub names: Vec<String>,
}

impl DatasetYaml {
    pub fn new(path: &Path, names: Vec<String>) -> Self {
        let images = |split: Split| format!("images/{split}");
        Self {
            path: path.to_string_lossy().into_owned(),
            train: images(Split::Train),
            val: images(Split::Val),
            test: images(Split::Test),
            nc: names.len(),
            names,
        }
    }

    pub fn load(path: &Path) -> StageResult<Self> {
        let text = read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|e| StageError::yaml(path, e))
    }

    pub fn save(&self, path: &Path) -> StageResult<()> {
        let text = serde_yaml::to_string(self).map_err(|e| StageError::yaml(path, e))?;
        write_file(path, text)
    }
}

/// A preprocessed image and its YOLO label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    pub stem: String,
    pub image: PathBuf,
    pub label: PathBuf,
    pub class_key: String,
}

impl Keyed for LabeledImage {
    fn class_key(&self) -> &str {
        &self.class_key
    }
}

/// Train images of `preprocessed` that have a label in `labels_dir`.
pub fn labeled_images(
    preprocessed: &Path,
    labels_dir: &Path,
    extractor: &dyn ClassKeyExtractor,
) -> StageResult<Vec<LabeledImage>> {
    let images = list_files(&DatasetLayout::new(preprocessed).train_images(), IMAGE_EXT)?;
    Ok(images
        .into_iter()
        .filter_map(|image| {
            let stem = image_stem(&image);
            let label = labels_dir.join(format!("{stem}.{LABEL_EXT}"));
            label.is_file().then(|| LabeledImage {
                class_key: extractor.class_key(&stem),
                stem,
                image,
                label,
            })
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct SplitSummary {
    pub output: PathBuf,
    pub train: usize,
    pub val: usize,
    pub test: usize,
    pub class_names: Vec<String>,
    pub warnings: Vec<Warning>,
}

impl SplitSummary {
    pub fn count(&self, split: Split) -> usize {
        match split {
            Split::Train => self.train,
            Split::Val => self.val,
            Split::Test => self.test,
        }
    }
}

/// Builds the final YOLO layout (`images/<split>`, `labels/<split>`,
/// `dataset.yaml`) from preprocessed train images and their labels.
pub fn split_dataset<R>(
    preprocessed: &Path,
    labels_dir: &Path,
    output: &Path,
    ratios: &SplitRatios,
    extractor: &dyn ClassKeyExtractor,
    rng: &mut R,
) -> StageResult<SplitSummary>
where
    R: Rng + ?Sized,
{
    ratios.validate()?;
    require_dir(&DatasetLayout::new(preprocessed).train_images())?;
    require_dir(labels_dir)?;

    let pairs = labeled_images(preprocessed, labels_dir, extractor)?;
    info!("splitting {} labeled images -> {output:?}", pairs.len());
    let assignment = stratified_split(&pairs, ratios, rng);

    let mut warnings = Vec::new();
    let classes_file = labels_dir.join(CLASSES_TXT);
    let class_names = if classes_file.is_file() {
        ClassVocabulary::from_classes_txt(&read_to_string(&classes_file)?)
            .names()
            .to_vec()
    } else {
        warn!("{classes_file:?} missing, naming the single class {FALLBACK_CLASS_NAME:?}");
        warnings.push(Warning::new(
            "missing_classes",
            format!("{} not found; using [{FALLBACK_CLASS_NAME:?}]", classes_file.display()),
        ));
        vec![FALLBACK_CLASS_NAME.to_string()]
    };

    let staging = StagingDir::new(output)?;
    let staged = staging.path();
    for split in Split::ALL {
        create_dir_all(&staged.join("images").join(split.as_str()))?;
        create_dir_all(&staged.join("labels").join(split.as_str()))?;
    }
    for (split, pair) in assignment.iter() {
        let images = staged.join("images").join(split.as_str());
        let labels = staged.join("labels").join(split.as_str());
        copy_file(&pair.image, &images.join(format!("{}.{IMAGE_EXT}", pair.stem)))?;
        copy_file(&pair.label, &labels.join(format!("{}.{LABEL_EXT}", pair.stem)))?;
    }

    let yaml = DatasetYaml::new(&absolute(output)?, class_names.clone());
    yaml.save(&staged.join(DATASET_YAML))?;

    let output = staging.commit()?;
    let summary = SplitSummary {
        output,
        train: assignment.train.len(),
        val: assignment.val.len(),
        test: assignment.test.len(),
        class_names,
        warnings,
    };
    info!(
        "split complete: {} train, {} val, {} test, {} classes",
        summary.train,
        summary.val,
        summary.test,
        summary.class_names.len()
    );
    Ok(summary)
}
