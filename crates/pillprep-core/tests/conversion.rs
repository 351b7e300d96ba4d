use approx::assert_abs_diff_eq;
use pillprep_core::convert::{build_vocabulary, convert_to_yolo, ClassVocabulary};
use pillprep_core::model::{render_label, AnnotationRecord, BoxAnnotation, YoloLabelLine};
use pillprep_core::PrepError;

fn record(width: f64, height: f64, boxes: Vec<BoxAnnotation>) -> AnnotationRecord {
    AnnotationRecord {
        image_id: 3,
        file_name: "K-000250-000573_0_2_0_2_75_000_200.png".to_string(),
        width,
        height,
        boxes,
    }
}

#[test]
fn vocabulary_ids_follow_sorted_keys() {
    let vocab = build_vocabulary(["b", "a", "c", "a"]);
    assert_eq!(3, vocab.len());
    assert_eq!(Some(0), vocab.id("a"));
    assert_eq!(Some(2), vocab.id("c"));
    assert_eq!(Some("b"), vocab.name(1));
    assert_eq!(None, vocab.id("z"));
    assert_eq!("a\nb\nc\n", vocab.to_classes_txt());

    let reread = ClassVocabulary::from_classes_txt("a\nb\n\nc\n");
    assert_eq!(vocab, reread);
}

#[test]
fn box_becomes_normalized_center_and_size() {
    let vocab = build_vocabulary(["000250"]);
    let rec = record(1280.0, 1280.0, vec![BoxAnnotation::new(320.0, 640.0, 128.0, 256.0)]);
    let label = convert_to_yolo(&rec, "000250", &vocab).unwrap();
    assert!(!label.class_fallback);
    assert_eq!(0, label.class_id);
    assert_eq!(1, label.lines.len());

    let line = label.lines[0];
    assert_abs_diff_eq!(0.3, line.center_x, epsilon = 1e-12);
    assert_abs_diff_eq!(0.6, line.center_y, epsilon = 1e-12);
    assert_abs_diff_eq!(0.1, line.width, epsilon = 1e-12);
    assert_abs_diff_eq!(0.2, line.height, epsilon = 1e-12);
    assert_eq!("0 0.300000 0.600000 0.100000 0.200000\n", render_label(&label.lines));
}

#[test]
fn square_thousand_pixel_example() {
    let vocab = build_vocabulary(["000250"]);
    let rec = record(1000.0, 1000.0, vec![BoxAnnotation::new(100.0, 200.0, 50.0, 80.0)]);
    let label = convert_to_yolo(&rec, "000250", &vocab).unwrap();
    assert_eq!("0 0.125000 0.240000 0.050000 0.080000\n", render_label(&label.lines));
}

#[test]
fn in_bounds_boxes_normalize_into_unit_range() {
    let vocab = build_vocabulary(["a", "b"]);
    let (w, h) = (976.0, 1280.0);
    let boxes = vec![
        BoxAnnotation::new(0.0, 0.0, w, h),
        BoxAnnotation::new(10.5, 20.25, 1.0, 1.0),
        BoxAnnotation::new(w - 3.0, h - 7.0, 3.0, 7.0),
    ];
    let label = convert_to_yolo(&record(w, h, boxes), "b", &vocab).unwrap();
    assert_eq!(1, label.class_id);
    for line in &label.lines {
        for v in [line.center_x, line.center_y, line.width, line.height] {
            assert!((0.0..=1.0).contains(&v), "{v}");
        }
    }
}

#[test]
fn unknown_key_falls_back_to_class_zero() {
    let vocab = build_vocabulary(["a"]);
    let rec = record(100.0, 100.0, vec![BoxAnnotation::new(0.0, 0.0, 10.0, 10.0)]);
    let label = convert_to_yolo(&rec, "missing", &vocab).unwrap();
    assert!(label.class_fallback);
    assert_eq!(0, label.lines[0].class_id);
}

#[test]
fn zero_boxes_give_an_empty_label() {
    let vocab = build_vocabulary(["a"]);
    let label = convert_to_yolo(&record(100.0, 100.0, Vec::new()), "a", &vocab).unwrap();
    assert!(label.lines.is_empty());
    assert_eq!("", render_label(&label.lines));
}

#[test]
fn zero_sized_image_is_rejected() {
    let vocab = build_vocabulary(["a"]);
    let rec = record(0.0, 100.0, vec![BoxAnnotation::new(0.0, 0.0, 1.0, 1.0)]);
    assert!(matches!(
        convert_to_yolo(&rec, "a", &vocab),
        Err(PrepError::InvalidDimensions { .. })
    ));
}

#[test]
fn label_lines_parse_back() {
    let line = YoloLabelLine::parse("4 0.5 0.25 0.1 0.2 0.99").unwrap();
    assert_eq!(4, line.class_id);
    assert_abs_diff_eq!(0.25, line.center_y);
    assert!(YoloLabelLine::parse("4 0.5 0.25 0.1").is_none());
    assert!(YoloLabelLine::parse("x 0.5 0.25 0.1 0.2").is_none());
}
