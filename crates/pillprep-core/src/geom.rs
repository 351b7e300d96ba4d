use crate::error::{PrepError, PrepResult};
use crate::model::{AnnotationRecord, BoxAnnotation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl BBox2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// True when `other` lies inside `self`, allowing `tol` of float slack.
    pub fn contains(&self, other: &Self, tol: f64) -> bool {
        other.min.x >= self.min.x - tol
            && other.min.y >= self.min.y - tol
            && other.max.x <= self.max.x + tol
            && other.max.y <= self.max.y + tol
    }
}

/// Letterbox transform from an image of arbitrary size onto a square canvas.
///
/// Image resampling and box remapping must both be driven by the same value so
/// that pixels and coordinates stay aligned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeParams {
    pub scale: f64,
    pub new_size: (u32, u32),
    pub padding: (u32, u32),
    pub target_size: u32,
}

impl ResizeParams {
    pub fn canvas(&self) -> BBox2 {
        let side = self.target_size as f64;
        BBox2::new(Vec2::new(0.0, 0.0), Vec2::new(side, side))
    }
}

pub fn compute_resize_params(width: u32, height: u32, target_size: u32) -> PrepResult<ResizeParams> {
    if width == 0 || height == 0 {
        return Err(PrepError::InvalidDimensions {
            width: width as f64,
            height: height as f64,
        });
    }
    if target_size == 0 {
        return Err(PrepError::config("target size must be positive"));
    }

    let target = target_size as f64;
    let scale = f64::min(target / width as f64, target / height as f64);

    // A degenerate strip (e.g. 1x5000) would otherwise floor to zero pixels.
    let new_w = ((width as f64 * scale).floor() as u32).clamp(1, target_size);
    let new_h = ((height as f64 * scale).floor() as u32).clamp(1, target_size);

    let pad_left = (target_size - new_w) / 2;
    let pad_top = (target_size - new_h) / 2;

    Ok(ResizeParams {
        scale,
        new_size: (new_w, new_h),
        padding: (pad_left, pad_top),
        target_size,
    })
}

pub fn remap_box(b: &BoxAnnotation, params: &ResizeParams) -> BoxAnnotation {
    let (pad_left, pad_top) = params.padding;
    BoxAnnotation {
        x: b.x * params.scale + pad_left as f64,
        y: b.y * params.scale + pad_top as f64,
        width: b.width * params.scale,
        height: b.height * params.scale,
    }
}

pub fn remap_boxes(annotation: &AnnotationRecord, params: &ResizeParams) -> AnnotationRecord {
    AnnotationRecord {
        image_id: annotation.image_id,
        file_name: annotation.file_name.clone(),
        width: params.target_size as f64,
        height: params.target_size as f64,
        boxes: annotation
            .boxes
            .iter()
            .map(|b| remap_box(b, params))
            .collect(),
    }
}

