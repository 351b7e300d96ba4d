use crate::error::{StageError, StageResult};
use crate::fsutil::{list_files, write_file, StagingDir};
use crate::layout::{DATASET_YAML, IMAGE_EXT, LABEL_EXT, REPORT_FILE};
use crate::split::DatasetYaml;
use log::{debug, info, warn};
use pillprep_core::analysis::{Analyzer, SplitAccumulator};
use pillprep_core::model::Split;
use pillprep_core::report::{DatasetInfo, QualityReport, SplitAnalysis, SplitAnalysisSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: QualityReport,
    pub report_path: PathBuf,
}

fn analyze_split(
    analyzer: &Analyzer,
    dataset: &Path,
    split: Split,
    class_names: &[String],
) -> StageResult<SplitAnalysis> {
    let images = list_files(&dataset.join("images").join(split.as_str()), IMAGE_EXT)?;
    let labels = list_files(&dataset.join("labels").join(split.as_str()), LABEL_EXT)?;
    let mut acc = SplitAccumulator::new(class_names, images.len(), labels.len());

    for path in images.iter().take(analyzer.config().image_sample_cap) {
        let Ok((w, h)) = image::image_dimensions(path) else {
            debug!("skipping unreadable image {path:?}");
            continue;
        };
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        acc.record_image(w, h, size);
    }
    for path in &labels {
        match fs::read(path) {
            // Invalid UTF-8 turns into lines that fail to parse and count as malformed.
            Ok(bytes) => acc.record_label(&String::from_utf8_lossy(&bytes)),
            Err(err) => warn!("skipping unreadable label {path:?}: {err}"),
        }
    }
    Ok(acc.finish())
}

/// Computes the quality report of a final YOLO dataset. Reads
/// `<dataset>/dataset.yaml` for class names; without it there is nothing to
/// analyze.
pub fn analyze_dataset(dataset: &Path, analyzer: &Analyzer) -> StageResult<QualityReport> {
    let yaml_path = dataset.join(DATASET_YAML);
    if !yaml_path.is_file() {
        return Err(StageError::MissingDatasetYaml {
            path: dataset.to_path_buf(),
        });
    }
    let yaml = DatasetYaml::load(&yaml_path)?;
    info!("analyzing {dataset:?} ({} classes)", yaml.nc);

    let mut splits = SplitAnalysisSet::default();
    for split in Split::ALL {
        *splits.get_mut(split) = analyze_split(analyzer, dataset, split, &yaml.names)?;
    }

    let info = DatasetInfo {
        total_classes: yaml.nc,
        class_names: yaml.names,
        dataset_path: dataset.to_string_lossy().into_owned(),
    };
    Ok(analyzer.build_report(info, splits))
}

/// Analyzes `dataset` and replaces `report_dir` with a directory holding
/// `dataset_analysis_report.json`.
pub fn run_analysis(dataset: &Path, report_dir: &Path, analyzer: &Analyzer) -> StageResult<AnalysisOutcome> {
    let report = analyze_dataset(dataset, analyzer)?;

    let staging = StagingDir::new(report_dir)?;
    let staged_file = staging.path().join(REPORT_FILE);
    let json = serde_json::to_vec_pretty(&report).map_err(|e| StageError::json(&staged_file, e))?;
    write_file(&staged_file, json)?;
    let report_dir = staging.commit()?;

    let report_path = report_dir.join(REPORT_FILE);
    log_summary(&report);
    info!("analysis report saved: {report_path:?}");
    Ok(AnalysisOutcome {
        report,
        report_path,
    })
}

fn log_summary(report: &QualityReport) {
    let overall = &report.overall_stats;
    let quality = &report.quality_metrics;
    info!(
        "{} images, {} objects, {:.2} objects/image",
        overall.total_images, overall.total_objects, overall.avg_objects_per_image
    );
    for (split, analysis) in report.split_analysis.iter() {
        info!(
            "  {split}: {} images, {} labels",
            analysis.image_count, analysis.label_count
        );
    }
    info!(
        "class balance {:.3} ({}), quality score {:.3}",
        overall.class_balance_score,
        if quality.balance_ok { "ok" } else { "imbalanced" },
        quality.overall_quality_score
    );
}
