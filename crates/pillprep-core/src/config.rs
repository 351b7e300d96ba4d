use crate::analysis::AnalysisConfig;
use crate::error::{PrepError, PrepResult};
use crate::report::Warning;
use crate::sample::SamplingStrategy;
use crate::split::SplitRatios;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRESET: &str = "development";
pub const DEFAULT_TARGET_SIZE: u32 = 1280;

/// How many items to draw from the source corpus, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRequest {
    pub train_size: usize,
    pub test_size: usize,
    pub strategy: SamplingStrategy,
}

impl SampleRequest {
    pub fn validate(&self) -> PrepResult<()> {
        if self.train_size == 0 || self.test_size == 0 {
            return Err(PrepError::config(format!(
                "train and test sizes must be positive (got {} / {})",
                self.train_size, self.test_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPreset {
    pub name: String,
    pub train_size: usize,
    pub test_size: usize,
    /// Directory name, relative to the data root.
    pub output_dir: String,
    pub strategy: SamplingStrategy,
    #[serde(default)]
    pub description: String,
}

impl DatasetPreset {
    pub fn new(
        name: &str,
        train_size: usize,
        test_size: usize,
        strategy: SamplingStrategy,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            train_size,
            test_size,
            output_dir: format!("{name}_data"),
            strategy,
            description: description.to_string(),
        }
    }

    pub fn request(&self) -> SampleRequest {
        SampleRequest {
            train_size: self.train_size,
            test_size: self.test_size,
            strategy: self.strategy,
        }
    }

    pub fn validate(&self) -> PrepResult<()> {
        if self.output_dir.trim().is_empty() {
            return Err(PrepError::config(format!(
                "preset {:?} has an empty output directory",
                self.name
            )));
        }
        self.request().validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPreset {
    pub preset: DatasetPreset,
    /// Present when the requested name was unknown and the default was used.
    pub warning: Option<Warning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetTable {
    presets: Vec<DatasetPreset>,
}

impl PresetTable {
    pub fn builtin() -> Self {
        use SamplingStrategy::*;
        Self {
            presets: vec![
                DatasetPreset::new("prototype", 50, 25, Random, "very fast prototype runs"),
                DatasetPreset::new("development", 150, 75, Balanced, "development and debugging"),
                DatasetPreset::new("experiment", 300, 150, Quality, "model and hyperparameter experiments"),
                DatasetPreset::new("validation", 500, 250, Balanced, "model performance validation"),
                DatasetPreset::new("demo", 100, 50, Quality, "high quality samples for demos"),
                DatasetPreset::new("analysis", 200, 100, Balanced, "data analysis and visualisation"),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&DatasetPreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Looks a preset up by name, falling back to [`DEFAULT_PRESET`] with a
    /// warning when the name is unknown.
    pub fn resolve(&self, name: &str) -> PrepResult<ResolvedPreset> {
        if let Some(preset) = self.get(name) {
            return Ok(ResolvedPreset {
                preset: preset.clone(),
                warning: None,
            });
        }
        let fallback = self.get(DEFAULT_PRESET).ok_or_else(|| {
            PrepError::config(format!(
                "unknown preset {name:?} and no {DEFAULT_PRESET:?} preset to fall back to"
            ))
        })?;
        Ok(ResolvedPreset {
            preset: fallback.clone(),
            warning: Some(Warning::new(
                "unknown_preset",
                format!("preset {name:?} not found; using {DEFAULT_PRESET:?}"),
            )),
        })
    }

    /// Adds a preset, replacing any preset with the same name.
    pub fn insert(&mut self, preset: DatasetPreset) -> PrepResult<()> {
        preset.validate()?;
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
        Ok(())
    }

    /// Appends every preset of `other`, replacing same-named entries.
    pub fn merge(&mut self, other: PresetTable) -> PrepResult<()> {
        for preset in other.presets {
            self.insert(preset)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetPreset> {
        self.presets.iter()
    }
}

impl Default for PresetTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Settings shared by every stage after sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub target_size: u32,
    pub ratios: SplitRatios,
    /// Seed for sampling and splitting; `None` draws one from the OS.
    pub seed: Option<u64>,
    pub min_image_size: u32,
    pub image_sample_cap: usize,
    pub min_balance_score: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let analysis = AnalysisConfig::default();
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            ratios: SplitRatios::default(),
            seed: None,
            min_image_size: 100,
            image_sample_cap: analysis.image_sample_cap,
            min_balance_score: analysis.min_balance_score,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> PrepResult<()> {
        if self.target_size == 0 {
            return Err(PrepError::config("target size must be positive"));
        }
        self.ratios.validate()
    }

    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            image_sample_cap: self.image_sample_cap,
            min_balance_score: self.min_balance_score,
            ..AnalysisConfig::default()
        }
    }
}
