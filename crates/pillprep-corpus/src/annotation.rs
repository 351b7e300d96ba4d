use crate::error::{StageError, StageResult};
use crate::fsutil::{glob_sorted, write_file};
use crate::layout::TRAIN_ANNOTATIONS;
use pillprep_core::geom::{remap_box, ResizeParams};
use pillprep_core::model::{file_stem, AnnotationRecord, BoxAnnotation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One annotation JSON file as found in the corpus. Fields the pipeline does
/// not interpret are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationFile {
    #[serde(default)]
    pub images: Vec<ImageEntry>,
    #[serde(default)]
    pub annotations: Vec<AnnotationEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub id: i64,
    pub file_name: String,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    pub image_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationFile {
    pub fn load(path: &Path) -> StageResult<Self> {
        let raw = fs::read(path).map_err(|e| StageError::io(path, e))?;
        serde_json::from_slice(&raw).map_err(|e| StageError::json(path, e))
    }

    pub fn save(&self, path: &Path) -> StageResult<()> {
        let json = serde_json::to_vec_pretty(self).map_err(|e| StageError::json(path, e))?;
        write_file(path, json)
    }

    /// One record per image entry, with that image's boxes in file order.
    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.images
            .iter()
            .map(|img| AnnotationRecord {
                image_id: img.id,
                file_name: img.file_name.clone(),
                width: img.width,
                height: img.height,
                boxes: self
                    .annotations
                    .iter()
                    .filter(|a| a.image_id == img.id)
                    .filter_map(|a| a.bbox.map(BoxAnnotation::from_xywh))
                    .collect(),
            })
            .collect()
    }

    /// Rewrites every box and image size for a letterboxed image, in place.
    pub fn remap(&mut self, params: &ResizeParams) {
        for ann in &mut self.annotations {
            if let Some(bbox) = ann.bbox {
                ann.bbox = Some(remap_box(&BoxAnnotation::from_xywh(bbox), params).to_xywh());
            }
        }
        let side = params.target_size as f64;
        for img in &mut self.images {
            img.width = side;
            img.height = side;
        }
    }
}

/// Maps image stems to annotation files under
/// `train_annotations/<group>/<subgroup>/<stem>.json`.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    root: PathBuf,
    by_stem: HashMap<String, PathBuf>,
}

impl AnnotationIndex {
    /// Indexes `<dataset>/train_annotations`. When several files share a stem
    /// the first one in path order wins.
    pub fn build(dataset_root: &Path) -> StageResult<Self> {
        let root = dataset_root.join(TRAIN_ANNOTATIONS);
        let mut by_stem = HashMap::new();
        if root.is_dir() {
            for path in glob_sorted(&root, "*/*/*.json")? {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                by_stem.entry(stem).or_insert(path);
            }
        }
        Ok(Self { root, by_stem })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn find(&self, image_stem: &str) -> Option<&Path> {
        self.by_stem.get(image_stem).map(PathBuf::as_path)
    }

    /// Path of `annotation` relative to the indexed annotation root.
    pub fn relative<'a>(&self, annotation: &'a Path) -> &'a Path {
        annotation.strip_prefix(&self.root).unwrap_or(annotation)
    }

    pub fn len(&self) -> usize {
        self.by_stem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_stem.is_empty()
    }
}

pub fn image_stem(path: &Path) -> String {
    path.file_name()
        .map(|n| file_stem(&n.to_string_lossy()).to_string())
        .unwrap_or_default()
}
