pub const VALIDATION_SCRIPT: &str = include_str!("templates/validate_dataset.py");

pub fn readme(created_at: &str, target_size: u32) -> String {
    format!(
        r#"# Pill Detection Dataset

## Dataset Information
- **Creation Date**: {created_at}
- **Format**: YOLO
- **Image Size**: {target_size}x{target_size} pixels, letterboxed on black
- **Purpose**: pill detection and classification

## Directory Structure
```
dataset/
├── images/{{train,val,test}}/   # PNG images
├── labels/{{train,val,test}}/   # one YOLO label per image
└── dataset.yaml                # training config

reports/
└── dataset_analysis_report.json

docs/
├── README.md
├── USAGE_GUIDE.md
├── metadata.json
├── validate_dataset.py
└── DELIVERY_CHECKLIST.md
```

## Quick Start
1. Run `python docs/validate_dataset.py` from the package root.
2. Point the trainer at `dataset/dataset.yaml`.
3. See `reports/` for split and class statistics.
"#
    )
}

pub fn usage_guide(target_size: u32) -> String {
    format!(
        r#"# Dataset Usage Guide

## Training
```python
from ultralytics import YOLO

model = YOLO("yolov8n.pt")
model.train(data="dataset/dataset.yaml", epochs=100, imgsz={target_size}, batch=16)
```

## Label Format
One line per object, coordinates normalised to the image size:
```
<class_id> <center_x> <center_y> <width> <height>
```
Class ids index `names` in `dataset.yaml`. An empty label file means the image
has no objects.

## dataset.yaml
```yaml
path: /absolute/path/to/dataset
train: images/train
val: images/val
test: images/test
nc: <number of classes>
names: [...]
```
`path` is absolute on the machine that built the package; edit it after
moving the dataset.

## Validation
```bash
python docs/validate_dataset.py
```
"#
    )
}

#[derive(Debug, Clone)]
pub struct ChecklistInfo {
    pub created_on: String,
    pub package_size_mb: f64,
    pub total_images: usize,
    pub total_classes: usize,
    pub validation_passed: bool,
    pub reports_included: bool,
}

pub fn delivery_checklist(info: &ChecklistInfo) -> String {
    let check = |ok: bool| if ok { "x" } else { " " };
    let mark = check(info.validation_passed);
    let reports = check(info.reports_included);
    format!(
        r#"# Delivery Checklist

## Before Delivery
- [{mark}] required directories present
- [{mark}] image/label pairs match in every split
- [{mark}] dataset.yaml present
- [ ] validation script run by the receiving team
- [{reports}] analysis report included

## Package Contents
- [{mark}] dataset/ in YOLO layout
- [{reports}] reports/ with analysis results
- [{mark}] docs/ with README, usage guide and validation script

## Handover
- [ ] package location shared
- [ ] access confirmed
- [ ] receipt confirmed by the modeling team

## Package Information
- Created: {created_on}
- Package size: {size:.1} MB
- Total images: {images}
- Total classes: {classes}
"#,
        created_on = info.created_on,
        size = info.package_size_mb,
        images = info.total_images,
        classes = info.total_classes,
    )
}
