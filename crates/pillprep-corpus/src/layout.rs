use std::path::{Path, PathBuf};

pub const TRAIN_IMAGES: &str = "train_images";
pub const TEST_IMAGES: &str = "test_images";
pub const TRAIN_ANNOTATIONS: &str = "train_annotations";

pub const PREPROCESSED: &str = "preprocessed";
pub const YOLO_LABELS: &str = "yolo_labels";
pub const FINAL_DATASET: &str = "final_dataset";
pub const REPORTS: &str = "reports";
pub const DELIVERY: &str = "delivery";

pub const CLASSES_TXT: &str = "classes.txt";
pub const DATASET_YAML: &str = "dataset.yaml";
pub const REPORT_FILE: &str = "dataset_analysis_report.json";

pub const IMAGE_EXT: &str = "png";
pub const LABEL_EXT: &str = "txt";

/// Paths of one dataset directory and the stage outputs kept inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn train_images(&self) -> PathBuf {
        self.root.join(TRAIN_IMAGES)
    }

    pub fn test_images(&self) -> PathBuf {
        self.root.join(TEST_IMAGES)
    }

    pub fn train_annotations(&self) -> PathBuf {
        self.root.join(TRAIN_ANNOTATIONS)
    }

    pub fn preprocessed(&self) -> DatasetLayout {
        DatasetLayout::new(self.root.join(PREPROCESSED))
    }

    pub fn yolo_labels(&self) -> PathBuf {
        self.root.join(YOLO_LABELS)
    }

    pub fn final_dataset(&self) -> PathBuf {
        self.root.join(FINAL_DATASET)
    }

    pub fn reports(&self) -> PathBuf {
        self.root.join(REPORTS)
    }

    pub fn delivery(&self) -> PathBuf {
        self.root.join(DELIVERY)
    }
}
