use log::{info, warn};
use pillprep_core::analysis::Analyzer;
use pillprep_core::class_key::{ClassKeyExtractor, SegmentKeyExtractor};
use pillprep_core::config::{DatasetPreset, PipelineConfig, PresetTable, SampleRequest};
use pillprep_core::report::{QualityReport, Warning};
use pillprep_core::sample::SamplingStrategy;
use pillprep_corpus::analyze::run_analysis;
use pillprep_corpus::layout::DatasetLayout;
use pillprep_corpus::preprocess::{preprocess_dataset, PreprocessSummary};
use pillprep_corpus::split::{split_dataset, SplitSummary};
use pillprep_corpus::subset::{create_subset, SubsetSummary};
use pillprep_corpus::validate::{validate_dataset, ValidationSummary};
use pillprep_corpus::yolo::{convert_annotations, ConversionSummary};
use pillprep_corpus::StageResult;
use pillprep_package::{default_package_name, package_for_delivery, PackageOptions, PackageResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProcessingReport {
    pub dataset: PathBuf,
    pub validation: ValidationSummary,
    pub preprocessing: PreprocessSummary,
    pub conversion: ConversionSummary,
    pub split: SplitSummary,
    pub analysis: QualityReport,
    pub report_path: PathBuf,
    pub packaging: PackageResult,
}

impl ProcessingReport {
    /// Every item-level warning raised by the processing stages.
    pub fn warnings(&self) -> impl Iterator<Item = &Warning> + '_ {
        self.preprocessing
            .warnings
            .iter()
            .chain(&self.conversion.warnings)
            .chain(&self.split.warnings)
    }
}

#[derive(Debug, Clone)]
pub struct CreateReport {
    pub preset: DatasetPreset,
    pub subset: SubsetSummary,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub preset: DatasetPreset,
    pub subset: SubsetSummary,
    pub processing: ProcessingReport,
    /// Pipeline-level fallbacks, such as an unknown preset name.
    pub warnings: Vec<Warning>,
}

/// Runs the preparation stages against a data root holding the source corpus
/// (`train_images/`, `test_images/`, `train_annotations/`).
pub struct Pipeline {
    data_root: PathBuf,
    config: PipelineConfig,
    presets: PresetTable,
    extractor: Box<dyn ClassKeyExtractor>,
}

impl Pipeline {
    pub fn new(data_root: impl Into<PathBuf>, config: PipelineConfig, presets: PresetTable) -> StageResult<Self> {
        config.validate()?;
        Ok(Self {
            data_root: data_root.into(),
            config,
            presets,
            extractor: Box::new(SegmentKeyExtractor::default()),
        })
    }

    pub fn with_extractor(mut self, extractor: impl ClassKeyExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn resolve(&self, preset_name: &str) -> StageResult<(DatasetPreset, Vec<Warning>)> {
        let resolved = self.presets.resolve(preset_name)?;
        resolved.preset.validate()?;
        let warnings: Vec<Warning> = resolved.warning.into_iter().collect();
        for w in &warnings {
            warn!("{}", w.message);
        }
        Ok((resolved.preset, warnings))
    }

    fn create<R: Rng + ?Sized>(
        &self,
        output: &Path,
        request: &SampleRequest,
        rng: &mut R,
    ) -> StageResult<SubsetSummary> {
        create_subset(&self.data_root, output, request, self.extractor.as_ref(), rng)
    }

    /// Draws the preset's subset into `<data_root>/<output_dir>` without
    /// processing it.
    pub fn create_by_preset(&self, preset_name: &str) -> StageResult<CreateReport> {
        let (preset, warnings) = self.resolve(preset_name)?;
        let output = self.data_root.join(&preset.output_dir);
        let subset = self.create(&output, &preset.request(), &mut self.rng())?;
        info!("dataset ready at {:?}", subset.output);
        Ok(CreateReport {
            preset,
            subset,
            warnings,
        })
    }

    /// Subset creation followed by every processing stage.
    pub fn run_complete(&self, preset_name: &str) -> StageResult<PipelineReport> {
        let (preset, warnings) = self.resolve(preset_name)?;
        info!(
            "complete pipeline: preset {} ({} train / {} test, {})",
            preset.name, preset.train_size, preset.test_size, preset.strategy
        );
        let mut rng = self.rng();
        let output = self.data_root.join(&preset.output_dir);
        let subset = self.create(&output, &preset.request(), &mut rng)?;
        let processing = self.process(&subset.output, &default_package_name(&preset.name), &mut rng)?;
        Ok(PipelineReport {
            preset,
            subset,
            processing,
            warnings,
        })
    }

    /// Like [`Pipeline::run_complete`] with ad-hoc sizes; output goes to
    /// `<data_root>/<name>_data`.
    pub fn run_custom(
        &self,
        train_size: usize,
        test_size: usize,
        name: &str,
        strategy: SamplingStrategy,
    ) -> StageResult<PipelineReport> {
        let preset = DatasetPreset::new(name, train_size, test_size, strategy, "custom run");
        preset.validate()?;
        info!("custom pipeline: {train_size} train / {test_size} test, {strategy}");

        let mut rng = self.rng();
        let output = self.data_root.join(&preset.output_dir);
        let subset = self.create(&output, &preset.request(), &mut rng)?;
        let processing = self.process(&subset.output, &default_package_name(name), &mut rng)?;
        Ok(PipelineReport {
            preset,
            subset,
            processing,
            warnings: Vec::new(),
        })
    }

    /// Validation through packaging on an existing dataset directory.
    pub fn run_processing_only(&self, dataset: &Path) -> StageResult<ProcessingReport> {
        self.process(dataset, &default_package_name("processed"), &mut self.rng())
    }

    fn process<R: Rng + ?Sized>(
        &self,
        dataset: &Path,
        package_name: &str,
        rng: &mut R,
    ) -> StageResult<ProcessingReport> {
        let layout = DatasetLayout::new(dataset);
        let cfg = &self.config;
        let extractor = self.extractor.as_ref();

        info!("stage 1/6: validation");
        let validation = validate_dataset(dataset, cfg.min_image_size)?;

        info!("stage 2/6: preprocessing");
        let pre = layout.preprocessed();
        let preprocessing = preprocess_dataset(dataset, pre.root(), cfg.target_size)?;

        info!("stage 3/6: annotation conversion");
        let conversion = convert_annotations(pre.root(), &layout.yolo_labels(), extractor)?;

        info!("stage 4/6: split");
        let split = split_dataset(
            pre.root(),
            &layout.yolo_labels(),
            &layout.final_dataset(),
            &cfg.ratios,
            extractor,
            rng,
        )?;

        info!("stage 5/6: analysis");
        let analyzer = Analyzer::new(cfg.analysis());
        let outcome = run_analysis(&layout.final_dataset(), &layout.reports(), &analyzer)?;

        info!("stage 6/6: packaging");
        let packaging = package_for_delivery(
            &layout.final_dataset(),
            &layout.reports(),
            &layout.delivery(),
            &PackageOptions {
                name: package_name.to_string(),
                target_size: cfg.target_size,
            },
        )?;

        info!(
            "pipeline finished: quality score {:.3}, archive {:?}",
            outcome.report.quality_metrics.overall_quality_score, packaging.archive_path
        );
        Ok(ProcessingReport {
            dataset: dataset.to_path_buf(),
            validation,
            preprocessing,
            conversion,
            split,
            analysis: outcome.report,
            report_path: outcome.report_path,
            packaging,
        })
    }
}
