use crate::error::{PrepError, PrepResult};
use crate::model::{AnnotationRecord, YoloLabelLine};
use std::collections::{BTreeSet, HashMap};

/// Dense class ids assigned in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassVocabulary {
    names: Vec<String>,
    ids: HashMap<String, u32>,
}

impl ClassVocabulary {
    pub fn from_sorted_names(names: Vec<String>) -> Self {
        let ids = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id as u32))
            .collect();
        Self { names, ids }
    }

    pub fn id(&self, key: &str) -> Option<u32> {
        self.ids.get(key).copied()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `classes.txt` contents: one key per line, in id order.
    pub fn to_classes_txt(&self) -> String {
        let mut out = String::new();
        for name in &self.names {
            out.push_str(name);
            out.push('\n');
        }
        out
    }

    pub fn from_classes_txt(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_sorted_names(names)
    }
}

pub fn build_vocabulary<I, S>(keys: I) -> ClassVocabulary
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let distinct: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
    ClassVocabulary::from_sorted_names(distinct.into_iter().collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedLabel {
    pub lines: Vec<YoloLabelLine>,
    pub class_id: u32,
    /// Set when the class key was missing from the vocabulary and id 0 was used.
    pub class_fallback: bool,
}

pub fn convert_to_yolo(
    record: &AnnotationRecord,
    class_key: &str,
    vocabulary: &ClassVocabulary,
) -> PrepResult<ConvertedLabel> {
    let (img_w, img_h) = (record.width, record.height);
    if !(img_w > 0.0 && img_h > 0.0) {
        return Err(PrepError::InvalidDimensions {
            width: img_w,
            height: img_h,
        });
    }

    let (class_id, class_fallback) = match vocabulary.id(class_key) {
        Some(id) => (id, false),
        None => (0, true),
    };

    let lines = record
        .boxes
        .iter()
        .map(|b| YoloLabelLine {
            class_id,
            center_x: (b.x + b.width / 2.0) / img_w,
            center_y: (b.y + b.height / 2.0) / img_h,
            width: b.width / img_w,
            height: b.height / img_h,
        })
        .collect();

    Ok(ConvertedLabel {
        lines,
        class_id,
        class_fallback,
    })
}
