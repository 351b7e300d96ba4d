use pillprep_core::PrepError;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type StageResult<T> = Result<T, StageError>;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("required source is missing: {path}")]
    MissingSource { path: PathBuf },
    #[error("dataset.yaml not found in {path}")]
    MissingDatasetYaml { path: PathBuf },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("yaml error at {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("image error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("bad glob pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error(transparent)]
    Core(#[from] PrepError),
}

impl StageError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        StageError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        StageError::Json {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn yaml(path: impl AsRef<Path>, source: serde_yaml::Error) -> Self {
        StageError::Yaml {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn image(path: impl AsRef<Path>, source: image::ImageError) -> Self {
        StageError::Image {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn missing(path: impl AsRef<Path>) -> Self {
        StageError::MissingSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, StageError::Core(e) if e.is_config())
    }

    /// Missing inputs a stage cannot run without.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            StageError::MissingSource { .. } | StageError::MissingDatasetYaml { .. }
        )
    }
}
