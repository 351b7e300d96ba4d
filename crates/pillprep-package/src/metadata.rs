use pillprep_core::model::Split;
use pillprep_corpus::fsutil::list_files;
use pillprep_corpus::layout::{IMAGE_EXT, LABEL_EXT};
use pillprep_corpus::{StageError, StageResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Files whose digests go into `metadata.json`, relative to the package root.
pub const CHECKSUMMED_FILES: [&str; 3] = [
    "dataset/dataset.yaml",
    "docs/README.md",
    "docs/validate_dataset.py",
];

pub const PIPELINE_STEPS: [&str; 6] = [
    "source validation",
    "image preprocessing (letterbox resize)",
    "annotation conversion (COCO boxes to YOLO)",
    "stratified train/val/test split",
    "quality analysis",
    "packaging",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub created_at: String,
    pub format: String,
    pub image_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePreprocessing {
    pub target_size: u32,
    pub padding_color: [u8; 3],
    pub aspect_ratio_preserved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingPipeline {
    pub steps: Vec<String>,
    pub image_preprocessing: ImagePreprocessing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCount {
    pub images: usize,
    pub labels: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub package_info: PackageInfo,
    pub processing_pipeline: ProcessingPipeline,
    pub file_counts: BTreeMap<Split, FileCount>,
    /// Hex SHA-256 per file, keyed by path relative to the package root.
    pub checksums: BTreeMap<String, String>,
}

impl PackageMetadata {
    pub fn total_images(&self) -> usize {
        self.file_counts.values().map(|c| c.images).sum()
    }
}

pub fn sha256_file(path: &Path) -> StageResult<String> {
    let mut file = File::open(path).map_err(|e| StageError::io(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| StageError::io(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Images and labels per split of a YOLO dataset directory.
pub fn count_files(dataset: &Path) -> StageResult<BTreeMap<Split, FileCount>> {
    let mut counts = BTreeMap::new();
    for split in Split::ALL {
        let images = list_files(&dataset.join("images").join(split.as_str()), IMAGE_EXT)?;
        let labels = list_files(&dataset.join("labels").join(split.as_str()), LABEL_EXT)?;
        counts.insert(
            split,
            FileCount {
                images: images.len(),
                labels: labels.len(),
            },
        );
    }
    Ok(counts)
}

/// Digests of [`CHECKSUMMED_FILES`] that exist below `package_dir`.
pub fn checksums(package_dir: &Path) -> StageResult<BTreeMap<String, String>> {
    let mut sums = BTreeMap::new();
    for rel in CHECKSUMMED_FILES {
        let path = package_dir.join(rel);
        if path.is_file() {
            sums.insert(rel.to_string(), sha256_file(&path)?);
        }
    }
    Ok(sums)
}

pub fn build_metadata(
    package_dir: &Path,
    created_at: &str,
    target_size: u32,
) -> StageResult<PackageMetadata> {
    Ok(PackageMetadata {
        package_info: PackageInfo {
            name: "Pill Detection Dataset".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: created_at.to_string(),
            format: "YOLO".to_string(),
            image_size: format!("{target_size}x{target_size}"),
        },
        processing_pipeline: ProcessingPipeline {
            steps: PIPELINE_STEPS.iter().map(|s| s.to_string()).collect(),
            image_preprocessing: ImagePreprocessing {
                target_size,
                padding_color: [0, 0, 0],
                aspect_ratio_preserved: true,
            },
        },
        file_counts: count_files(&package_dir.join("dataset"))?,
        checksums: checksums(package_dir)?,
    })
}
