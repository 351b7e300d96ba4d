mod common;

use approx::assert_abs_diff_eq;
use common::{build_corpus, count_files, stem, write_png};
use pillprep_core::analysis::{AnalysisConfig, Analyzer};
use pillprep_core::class_key::SegmentKeyExtractor;
use pillprep_core::model::Split;
use pillprep_core::split::SplitRatios;
use pillprep_corpus::analyze::run_analysis;
use pillprep_corpus::annotation::{AnnotationFile, AnnotationIndex};
use pillprep_corpus::layout::DatasetLayout;
use pillprep_corpus::preprocess::{preprocess_dataset, resize_image};
use pillprep_corpus::scan::scan_test_images;
use pillprep_corpus::split::{split_dataset, DatasetYaml};
use pillprep_corpus::validate::validate_dataset;
use pillprep_corpus::yolo::convert_annotations;
use pillprep_corpus::StageError;
use image::{DynamicImage, GenericImageView, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

/// Runs preprocess, convert and split on a fresh corpus.
fn prepared_dataset(root: &Path, classes: &[(&str, usize)]) -> DatasetLayout {
    build_corpus(root, classes, 0, 20, 20);
    let layout = DatasetLayout::new(root);
    let extractor = SegmentKeyExtractor::default();
    let pre = layout.preprocessed();
    preprocess_dataset(root, pre.root(), 32).unwrap();
    convert_annotations(pre.root(), &layout.yolo_labels(), &extractor).unwrap();
    split_dataset(
        pre.root(),
        &layout.yolo_labels(),
        &layout.final_dataset(),
        &SplitRatios::default(),
        &extractor,
        &mut StdRng::seed_from_u64(5),
    )
    .unwrap();
    layout
}

fn sorted_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

#[test]
fn resize_letterboxes_onto_black_canvas() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, image::Rgb([255, 255, 255])));
    let (canvas, params) = resize_image(&img, 32).unwrap();
    assert_eq!((32, 32), canvas.dimensions());
    assert_eq!((32, 16), params.new_size);
    assert_eq!((0, 8), params.padding);
    assert_eq!(&image::Rgb([0, 0, 0]), canvas.get_pixel(16, 2));
    assert!(canvas.get_pixel(16, 16).0.iter().all(|&c| c > 200));
}

#[test]
fn validation_reports_small_images_and_missing_annotations() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    build_corpus(root, &[("000001", 2)], 1, 120, 110);
    write_png(&root.join("train_images").join("K-000002-a_0.png"), 50, 150);

    let summary = validate_dataset(root, 100).unwrap();
    assert_eq!(4, summary.images.total);
    assert_eq!(3, summary.images.valid);
    assert_abs_diff_eq!(0.75, summary.images.valid_ratio(), epsilon = 1e-12);
    assert!(summary.images.issues[0].contains("small image"));

    assert_eq!(3, summary.annotations.total);
    assert_eq!(2, summary.annotations.valid);
    assert!(summary.annotations.issues[0].contains("missing annotation"));
    assert!(!summary.is_clean());
}

#[test]
fn preprocess_rewrites_annotations_and_keeps_unknown_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    build_corpus(root, &[("003544", 1)], 1, 64, 32);

    let layout = DatasetLayout::new(root);
    let pre = layout.preprocessed();
    let summary = preprocess_dataset(root, pre.root(), 128).unwrap();
    assert_eq!(2, summary.processed);
    assert_eq!(0, summary.failed);

    let name = format!("{}.png", stem("003544", 0));
    let img = image::open(pre.train_images().join(&name)).unwrap();
    assert_eq!((128, 128), img.dimensions());
    assert_eq!(1, count_files(&pre.test_images(), "png"));

    let index = AnnotationIndex::build(pre.root()).unwrap();
    let file = AnnotationFile::load(index.find(&stem("003544", 0)).unwrap()).unwrap();
    // scale 2, vertical padding 32: [10, 20, 32, 16] -> [20, 72, 64, 32].
    let bbox = file.annotations[0].bbox.unwrap();
    for (expected, actual) in [20.0, 72.0, 64.0, 32.0].into_iter().zip(bbox) {
        assert_abs_diff_eq!(expected, actual, epsilon = 1e-9);
    }
    assert_eq!(128.0, file.images[0].width);
    assert_eq!("pill", file.images[0].extra["dl_name"]);
    assert_eq!(1, file.annotations[0].extra["category_id"]);
    assert!(file.extra.contains_key("categories"));
}

#[test]
fn full_stage_chain_produces_yolo_dataset_and_report() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    build_corpus(root, &[("000200", 10), ("000100", 10)], 2, 40, 40);
    let layout = DatasetLayout::new(root);
    let extractor = SegmentKeyExtractor::default();

    let pre = layout.preprocessed();
    preprocess_dataset(root, pre.root(), 64).unwrap();

    let conversion = convert_annotations(pre.root(), &layout.yolo_labels(), &extractor).unwrap();
    assert_eq!(20, conversion.converted);
    assert_eq!(vec!["000100", "000200"], conversion.vocabulary.names());
    assert_eq!(
        "000100\n000200\n",
        fs::read_to_string(layout.yolo_labels().join("classes.txt")).unwrap()
    );
    let label = fs::read_to_string(layout.yolo_labels().join(format!("{}.txt", stem("000200", 3)))).unwrap();
    assert!(label.starts_with("1 "), "{label}");
    assert_eq!(1, label.lines().count());

    let split = split_dataset(
        pre.root(),
        &layout.yolo_labels(),
        &layout.final_dataset(),
        &SplitRatios::default(),
        &extractor,
        &mut StdRng::seed_from_u64(3),
    )
    .unwrap();
    assert_eq!((16, 2, 2), (split.train, split.val, split.test));
    assert_eq!(2, split.count(Split::Val));
    let final_dir = layout.final_dataset();
    assert_eq!(16, count_files(&final_dir.join("images/train"), "png"));
    assert_eq!(16, count_files(&final_dir.join("labels/train"), "txt"));
    assert_eq!(2, count_files(&final_dir.join("labels/test"), "txt"));

    let yaml = DatasetYaml::load(&final_dir.join("dataset.yaml")).unwrap();
    assert_eq!(2, yaml.nc);
    assert_eq!("images/val", yaml.val);
    assert!(std::path::Path::new(&yaml.path).is_absolute());

    let analyzer = Analyzer::new(AnalysisConfig::default());
    let outcome = run_analysis(&final_dir, &layout.reports(), &analyzer).unwrap();
    let report = &outcome.report;
    assert_eq!(20, report.overall_stats.total_images);
    assert_eq!(20, report.overall_stats.total_objects);
    assert_eq!(1.0, report.overall_stats.class_balance_score);
    assert_eq!(1.0, report.quality_metrics.train_consistency);
    assert_eq!(Some(&8), report.split_analysis.train.class_distribution.get("000100"));

    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(&outcome.report_path).unwrap()).unwrap();
    for key in ["dataset_info", "split_analysis", "overall_stats", "quality_metrics"] {
        assert!(json.get(key).is_some(), "{key}");
    }
}

#[test]
fn split_without_classes_file_uses_single_fallback_name() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    build_corpus(root, &[("000001", 3)], 0, 20, 20);
    let layout = DatasetLayout::new(root);
    let extractor = SegmentKeyExtractor::default();
    let pre = layout.preprocessed();
    preprocess_dataset(root, pre.root(), 32).unwrap();
    convert_annotations(pre.root(), &layout.yolo_labels(), &extractor).unwrap();
    fs::remove_file(layout.yolo_labels().join("classes.txt")).unwrap();

    let split = split_dataset(
        pre.root(),
        &layout.yolo_labels(),
        &layout.final_dataset(),
        &SplitRatios::default(),
        &extractor,
        &mut StdRng::seed_from_u64(1),
    )
    .unwrap();
    assert_eq!(vec!["pill"], split.class_names);
    assert_eq!("missing_classes", split.warnings[0].code);
}

#[test]
fn analysis_without_dataset_yaml_is_structural_and_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let dataset = tmp.path().join("final_dataset");
    fs::create_dir_all(dataset.join("images/train")).unwrap();
    let reports = tmp.path().join("reports");

    let analyzer = Analyzer::new(AnalysisConfig::default());
    let err = run_analysis(&dataset, &reports, &analyzer).unwrap_err();
    assert!(matches!(err, StageError::MissingDatasetYaml { .. }));
    assert!(err.is_structural());
    assert!(!reports.exists());
}

#[test]
fn failed_rerun_keeps_previous_output() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let layout = prepared_dataset(root, &[("000001", 10)]);
    let final_dir = layout.final_dataset();
    let before = sorted_files(&final_dir.join("images/train"));
    let yaml_before = fs::read_to_string(final_dir.join("dataset.yaml")).unwrap();
    assert_eq!(8, before.len());

    // Without labels the rerun has no input.
    fs::remove_dir_all(layout.yolo_labels()).unwrap();
    let err = split_dataset(
        layout.preprocessed().root(),
        &layout.yolo_labels(),
        &final_dir,
        &SplitRatios::default(),
        &SegmentKeyExtractor::default(),
        &mut StdRng::seed_from_u64(9),
    )
    .unwrap_err();
    assert!(matches!(err, StageError::MissingSource { .. }));

    assert_eq!(before, sorted_files(&final_dir.join("images/train")));
    assert_eq!(yaml_before, fs::read_to_string(final_dir.join("dataset.yaml")).unwrap());
    assert!(!root.join(".final_dataset.partial").exists());
}

#[test]
fn corrupt_image_fails_alone_during_preprocessing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    build_corpus(root, &[("000001", 3)], 0, 20, 20);
    fs::write(root.join("train_images/K-000001-broken_0.png"), b"not a png").unwrap();

    let pre = DatasetLayout::new(root).preprocessed();
    let summary = preprocess_dataset(root, pre.root(), 32).unwrap();
    assert_eq!(3, summary.processed);
    assert_eq!(1, summary.failed);
    assert_abs_diff_eq!(0.75, summary.success_rate(), epsilon = 1e-12);
    assert!(summary.warnings.iter().any(|w| w.code == "image_failed"));
    assert_eq!(3, count_files(&pre.train_images(), "png"));
}

#[test]
fn invalid_annotation_json_is_skipped_during_conversion() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    build_corpus(root, &[("000001", 3)], 0, 20, 20);
    let broken = root.join("train_annotations/000001_json/K-000001/K-000001-broken.json");
    fs::write(&broken, "{ not json").unwrap();

    let layout = DatasetLayout::new(root);
    let summary =
        convert_annotations(root, &layout.yolo_labels(), &SegmentKeyExtractor::default()).unwrap();
    assert_eq!(3, summary.converted);
    assert!(summary.warnings.iter().any(|w| w.code == "invalid_annotation"));
    // Three labels plus classes.txt.
    assert_eq!(4, count_files(&layout.yolo_labels(), "txt"));
}

#[test]
fn unreadable_test_image_becomes_a_warning() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("test_images");
    write_png(&dir.join("K-000001-a_0.png"), 16, 16);
    fs::write(dir.join("K-000001-b_0.png"), b"garbage").unwrap();

    let scan = scan_test_images(&dir, &SegmentKeyExtractor::default()).unwrap();
    assert_eq!(1, scan.items.len());
    assert_eq!(1, scan.warnings.len());
    assert_eq!("unreadable_image", scan.warnings[0].code);
}

#[test]
fn undecodable_label_bytes_count_as_malformed_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let layout = prepared_dataset(root, &[("000001", 10)]);
    let final_dir = layout.final_dataset();
    let label = sorted_files(&final_dir.join("labels/train")).remove(0);
    fs::write(&label, b"0 0.5 0.5 0.1 0.1\n\xff\xfe junk\n").unwrap();

    let analyzer = Analyzer::new(AnalysisConfig::default());
    let outcome = run_analysis(&final_dir, &layout.reports(), &analyzer).unwrap();
    let train = &outcome.report.split_analysis.train;
    assert_eq!(1, train.bbox_stats.malformed_lines);
    assert_eq!(8, train.bbox_stats.total_objects);
    assert_eq!(10, outcome.report.overall_stats.total_objects);
    assert!(outcome.report_path.is_file());
}
