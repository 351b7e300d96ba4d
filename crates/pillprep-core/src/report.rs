use crate::model::Split;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
}

impl Warning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub total_classes: usize,
    pub class_names: Vec<String>,
    pub dataset_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub resolutions: Vec<(u32, u32)>,
    pub file_sizes: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BBoxStats {
    pub total_objects: usize,
    pub avg_objects_per_image: f64,
    pub bbox_sizes: Vec<(f64, f64)>,
    pub bbox_centers: Vec<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects_per_image_dist: Option<Distribution>,
    pub malformed_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitAnalysis {
    pub image_count: usize,
    pub label_count: usize,
    pub class_distribution: BTreeMap<String, usize>,
    pub bbox_stats: BBoxStats,
    pub image_stats: ImageStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitAnalysisSet {
    pub train: SplitAnalysis,
    pub val: SplitAnalysis,
    pub test: SplitAnalysis,
}

impl SplitAnalysisSet {
    pub fn get(&self, split: Split) -> &SplitAnalysis {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn get_mut(&mut self, split: Split) -> &mut SplitAnalysis {
        match split {
            Split::Train => &mut self.train,
            Split::Val => &mut self.val,
            Split::Test => &mut self.test,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Split, &SplitAnalysis)> + '_ {
        Split::ALL.into_iter().map(move |split| (split, self.get(split)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitFractions {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_images: usize,
    pub total_objects: usize,
    pub avg_objects_per_image: f64,
    pub split_ratios: SplitFractions,
    pub class_distribution: BTreeMap<String, usize>,
    pub most_common_classes: Vec<ClassCount>,
    pub class_balance_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub train_consistency: f64,
    pub val_consistency: f64,
    pub test_consistency: f64,
    /// Heuristic summary, not a statistical measure: the mean of the average
    /// per-split consistency and a dataset-size adequacy term.
    pub overall_quality_score: f64,
    pub balance_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub dataset_info: DatasetInfo,
    pub split_analysis: SplitAnalysisSet,
    pub overall_stats: OverallStats,
    pub quality_metrics: QualityMetrics,
}
