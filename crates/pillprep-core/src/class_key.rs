pub const UNKNOWN_CLASS_KEY: &str = "unknown";

/// Derives the grouping token used for stratified sampling, splitting and the
/// class vocabulary from an item identifier (usually a file stem).
pub trait ClassKeyExtractor {
    fn class_key(&self, identifier: &str) -> String;
}

impl<F> ClassKeyExtractor for F
where
    F: Fn(&str) -> String,
{
    fn class_key(&self, identifier: &str) -> String {
        self(identifier)
    }
}

/// Takes the `index`-th `delimiter`-separated segment of the identifier.
///
/// The default matches the pill corpus naming, where
/// `K-003544-010221-016551-027926_0_2_0_2_70_000_200` groups under `003544`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentKeyExtractor {
    pub delimiter: char,
    pub index: usize,
}

impl Default for SegmentKeyExtractor {
    fn default() -> Self {
        Self {
            delimiter: '-',
            index: 1,
        }
    }
}

impl ClassKeyExtractor for SegmentKeyExtractor {
    fn class_key(&self, identifier: &str) -> String {
        let stem = identifier.trim();
        match stem.split(self.delimiter).nth(self.index) {
            Some(segment) if !segment.is_empty() && stem.contains(self.delimiter) => {
                segment.to_string()
            }
            _ => UNKNOWN_CLASS_KEY.to_string(),
        }
    }
}
