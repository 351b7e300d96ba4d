use thiserror::Error;

pub type PrepResult<T> = Result<T, PrepError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrepError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("unknown sampling strategy {0:?} (expected balanced, quality or random)")]
    UnknownStrategy(String),
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
}

impl PrepError {
    pub fn config(msg: impl Into<String>) -> Self {
        PrepError::Config(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, PrepError::Config(_) | PrepError::UnknownStrategy(_))
    }
}
