pub mod archive;
pub mod docs;
pub mod metadata;

use chrono::Local;
use docs::ChecklistInfo;
use log::{info, warn};
use pillprep_corpus::fsutil::{copy_dir_all, dir_size, require_dir, write_file, StagingDir};
use pillprep_corpus::layout::DATASET_YAML;
use pillprep_corpus::split::DatasetYaml;
use pillprep_corpus::{StageError, StageResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Entries a package must contain, relative to its root.
pub const REQUIRED_ITEMS: [&str; 10] = [
    "dataset",
    "dataset/dataset.yaml",
    "dataset/images/train",
    "dataset/images/val",
    "dataset/images/test",
    "dataset/labels/train",
    "dataset/labels/val",
    "dataset/labels/test",
    "docs/README.md",
    "docs/validate_dataset.py",
];

pub const CHECKLIST_FILE: &str = "docs/DELIVERY_CHECKLIST.md";

#[derive(Debug, Clone)]
pub struct PackageOptions {
    pub name: String,
    pub target_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageResult {
    pub package_path: PathBuf,
    pub archive_path: PathBuf,
    pub validation_passed: bool,
    pub missing_items: Vec<String>,
    pub package_size_mb: f64,
    pub checklist_path: PathBuf,
    pub ready_for_delivery: bool,
}

/// `pill_dataset_<label>_<YYYYMMDD>`.
pub fn default_package_name(label: &str) -> String {
    format!("pill_dataset_{label}_{}", Local::now().format("%Y%m%d"))
}

/// Required items missing below `package_dir`.
pub fn missing_items(package_dir: &Path) -> Vec<String> {
    REQUIRED_ITEMS
        .iter()
        .filter(|item| !package_dir.join(item).exists())
        .map(|item| item.to_string())
        .collect()
}

/// Assembles `<out>/<name>/` (dataset, reports, docs), validates it, archives
/// it as `<out>/<name>.tar.gz` and writes the delivery checklist.
pub fn package_for_delivery(
    dataset: &Path,
    reports: &Path,
    out: &Path,
    options: &PackageOptions,
) -> StageResult<PackageResult> {
    require_dir(dataset)?;
    info!("packaging {dataset:?} as {}", options.name);

    let now = Local::now();
    let package_dir = out.join(&options.name);
    let staging = StagingDir::new(&package_dir)?;
    let staged = staging.path();

    copy_dir_all(dataset, &staged.join("dataset"))?;
    let reports_included = reports.is_dir();
    if reports_included {
        copy_dir_all(reports, &staged.join("reports"))?;
    } else {
        warn!("no reports at {reports:?}; packaging without them");
    }

    let created_at = now.format("%Y-%m-%d %H:%M:%S").to_string();
    write_file(&staged.join("docs/README.md"), docs::readme(&created_at, options.target_size))?;
    write_file(&staged.join("docs/USAGE_GUIDE.md"), docs::usage_guide(options.target_size))?;
    write_file(&staged.join("docs/validate_dataset.py"), docs::VALIDATION_SCRIPT)?;

    let meta = metadata::build_metadata(staged, &now.to_rfc3339(), options.target_size)?;
    let meta_path = staged.join("docs/metadata.json");
    let json = serde_json::to_vec_pretty(&meta).map_err(|e| StageError::json(&meta_path, e))?;
    write_file(&meta_path, json)?;

    let missing = missing_items(staged);
    let validation_passed = missing.is_empty();
    if validation_passed {
        info!("package validation passed");
    } else {
        for item in &missing {
            warn!("package is missing {item}");
        }
    }

    // Archived from staging: a failed archive must not leave a committed package.
    let archive_path = out.join(format!("{}.tar.gz", options.name));
    archive::create_tar_gz(staged, &options.name, &archive_path)?;
    let package_path = match staging.commit() {
        Ok(path) => path,
        Err(err) => {
            let _ = fs::remove_file(&archive_path);
            return Err(err);
        }
    };
    info!("archive written: {archive_path:?}");

    let package_size_mb = dir_size(&package_path)? as f64 / (1024.0 * 1024.0);
    let total_classes = DatasetYaml::load(&package_path.join("dataset").join(DATASET_YAML))
        .map(|yaml| yaml.nc)
        .unwrap_or(0);
    let checklist_path = package_path.join(CHECKLIST_FILE);
    let checklist = docs::delivery_checklist(&ChecklistInfo {
        created_on: now.format("%Y-%m-%d").to_string(),
        package_size_mb,
        total_images: meta.total_images(),
        total_classes,
        validation_passed,
        reports_included,
    });
    write_file(&checklist_path, checklist)?;

    info!(
        "package ready: {package_size_mb:.1} MB, validation {}",
        if validation_passed { "PASSED" } else { "FAILED" }
    );
    Ok(PackageResult {
        package_path,
        archive_path,
        validation_passed,
        missing_items: missing,
        package_size_mb,
        checklist_path,
        ready_for_delivery: validation_passed,
    })
}
