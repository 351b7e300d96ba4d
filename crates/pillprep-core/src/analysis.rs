use crate::model::{Split, YoloLabelLine};
use crate::report::{
    ClassCount, DatasetInfo, Distribution, OverallStats, QualityMetrics, QualityReport,
    SplitAnalysis, SplitAnalysisSet, SplitFractions,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Images per split whose resolution and byte size are recorded.
    pub image_sample_cap: usize,
    pub top_classes: usize,
    pub min_balance_score: f64,
    /// Image count at which the dataset-size adequacy term saturates.
    pub adequate_image_count: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            image_sample_cap: 100,
            top_classes: 10,
            min_balance_score: 0.5,
            adequate_image_count: 100,
        }
    }
}

/// Collects statistics for one split, one file at a time.
pub struct SplitAccumulator<'a> {
    class_names: &'a [String],
    analysis: SplitAnalysis,
    objects_per_image: Vec<usize>,
}

impl<'a> SplitAccumulator<'a> {
    pub fn new(class_names: &'a [String], image_count: usize, label_count: usize) -> Self {
        Self {
            class_names,
            analysis: SplitAnalysis {
                image_count,
                label_count,
                ..SplitAnalysis::default()
            },
            objects_per_image: Vec::new(),
        }
    }

    pub fn record_image(&mut self, width: u32, height: u32, byte_size: u64) {
        let stats = &mut self.analysis.image_stats;
        stats.resolutions.push((width, height));
        stats.file_sizes.push(byte_size);
    }

    /// Adds one label file. Lines with fewer than five fields are skipped.
    pub fn record_label(&mut self, contents: &str) {
        let mut objects = 0;
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some(parsed) = YoloLabelLine::parse(line) else {
                self.analysis.bbox_stats.malformed_lines += 1;
                continue;
            };
            objects += 1;

            let name = class_name(self.class_names, parsed.class_id);
            *self.analysis.class_distribution.entry(name).or_insert(0) += 1;

            let bbox = &mut self.analysis.bbox_stats;
            bbox.bbox_sizes.push((parsed.width, parsed.height));
            bbox.bbox_centers.push((parsed.center_x, parsed.center_y));
        }
        self.analysis.bbox_stats.total_objects += objects;
        self.objects_per_image.push(objects);
    }

    pub fn finish(mut self) -> SplitAnalysis {
        if let Some(dist) = distribution(&self.objects_per_image) {
            self.analysis.bbox_stats.avg_objects_per_image = dist.mean;
            self.analysis.bbox_stats.objects_per_image_dist = Some(dist);
        }
        self.analysis
    }
}

pub fn class_name(class_names: &[String], class_id: u32) -> String {
    class_names
        .get(class_id as usize)
        .cloned()
        .unwrap_or_else(|| format!("class_{class_id}"))
}

pub struct Analyzer {
    cfg: AnalysisConfig,
}

impl Analyzer {
    pub fn new(cfg: AnalysisConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.cfg
    }

    pub fn build_report(&self, dataset_info: DatasetInfo, splits: SplitAnalysisSet) -> QualityReport {
        let overall_stats = self.overall_stats(&splits);
        let quality_metrics = self.quality_metrics(&splits, overall_stats.class_balance_score);
        QualityReport {
            dataset_info,
            split_analysis: splits,
            overall_stats,
            quality_metrics,
        }
    }

    fn overall_stats(&self, splits: &SplitAnalysisSet) -> OverallStats {
        let total_images: usize = splits.iter().map(|(_, s)| s.image_count).sum();
        let total_objects: usize = splits.iter().map(|(_, s)| s.bbox_stats.total_objects).sum();

        let mut class_distribution: BTreeMap<String, usize> = BTreeMap::new();
        for (_, split) in splits.iter() {
            for (name, count) in &split.class_distribution {
                *class_distribution.entry(name.clone()).or_insert(0) += count;
            }
        }

        let fraction = |split: Split| ratio(splits.get(split).image_count, total_images);

        OverallStats {
            total_images,
            total_objects,
            avg_objects_per_image: ratio(total_objects, total_images),
            split_ratios: SplitFractions {
                train: fraction(Split::Train),
                val: fraction(Split::Val),
                test: fraction(Split::Test),
            },
            most_common_classes: most_common(&class_distribution, self.cfg.top_classes),
            class_balance_score: round3(class_balance_score(&class_distribution)),
            class_distribution,
        }
    }

    fn quality_metrics(&self, splits: &SplitAnalysisSet, balance_score: f64) -> QualityMetrics {
        let per_split = |split: Split| {
            let s = splits.get(split);
            round3(consistency(s.label_count, s.image_count))
        };
        let train = per_split(Split::Train);
        let val = per_split(Split::Val);
        let test = per_split(Split::Test);

        let total_images: usize = splits.iter().map(|(_, s)| s.image_count).sum();
        let overall = overall_quality_score(
            &[train, val, test],
            total_images,
            self.cfg.adequate_image_count,
        );

        QualityMetrics {
            train_consistency: train,
            val_consistency: val,
            test_consistency: test,
            overall_quality_score: round3(overall),
            balance_ok: balance_score >= self.cfg.min_balance_score,
        }
    }
}

/// `1 / (1 + CV)` over the per-class counts. 1 means perfectly even; 0 for an
/// empty histogram.
pub fn class_balance_score(histogram: &BTreeMap<String, usize>) -> f64 {
    let counts: Vec<f64> = histogram.values().map(|&c| c as f64).collect();
    let Some((mean, std)) = mean_std(&counts) else {
        return 0.0;
    };
    if mean <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + std / mean)
}

/// Labels per image; 1.0 means every image has a label.
pub fn consistency(label_count: usize, image_count: usize) -> f64 {
    ratio(label_count, image_count)
}

pub fn overall_quality_score(consistencies: &[f64], total_images: usize, adequate: usize) -> f64 {
    let avg_consistency = mean_std(consistencies).map(|(m, _)| m).unwrap_or(0.0);
    let adequacy = if adequate == 0 {
        1.0
    } else {
        (total_images as f64 / adequate as f64).min(1.0)
    };
    (avg_consistency + adequacy) / 2.0
}

pub fn most_common(histogram: &BTreeMap<String, usize>, n: usize) -> Vec<ClassCount> {
    let mut entries: Vec<ClassCount> = histogram
        .iter()
        .map(|(name, &count)| ClassCount {
            name: name.clone(),
            count,
        })
        .collect();
    // BTreeMap order plus a stable sort breaks count ties by name.
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(n);
    entries
}

/// Population mean and standard deviation.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

fn distribution(values: &[usize]) -> Option<Distribution> {
    let min = *values.iter().min()?;
    let max = *values.iter().max()?;
    let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    let (mean, std) = mean_std(&as_f64)?;
    Some(Distribution {
        min,
        max,
        mean,
        std,
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
