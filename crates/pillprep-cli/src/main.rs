mod menu;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pillprep_core::config::{PipelineConfig, PresetTable, DEFAULT_PRESET, DEFAULT_TARGET_SIZE};
use pillprep_core::model::Split;
use pillprep_core::sample::SamplingStrategy;
use pillprep_pipeline::{CreateReport, Pipeline, PipelineReport, ProcessingReport};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pillprep")]
#[command(about = "Prepare pill detection datasets: sample, letterbox, convert to YOLO, split, analyze, package.")]
struct Cli {
    /// Directory holding train_images/, test_images/ and train_annotations/.
    #[arg(long, global = true, default_value = "./data")]
    data_root: PathBuf,
    #[arg(long, global = true, default_value_t = DEFAULT_TARGET_SIZE)]
    target_size: u32,
    /// Seed for sampling and splitting; omit for a random run.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// JSON file with extra presets; entries replace built-ins of the same name.
    #[arg(long, global = true)]
    presets: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a subset from a preset and run every processing stage.
    Complete {
        #[arg(default_value = DEFAULT_PRESET)]
        preset: String,
    },
    /// Complete pipeline with explicit sizes.
    Custom {
        train: usize,
        test: usize,
        #[arg(default_value = "custom")]
        name: String,
        #[arg(default_value = "balanced")]
        strategy: String,
    },
    /// Run validation through packaging on an existing dataset.
    Process { path: PathBuf },
    /// Only create the subset for a preset.
    Create { preset: String },
    /// Complete pipeline with the prototype preset.
    Prototype,
    /// Complete pipeline with the development preset.
    Development,
    /// Complete pipeline with the experiment preset.
    Experiment,
    /// Complete pipeline with the demo preset.
    Demo,
    /// List available presets.
    List,
    /// Interactive menu.
    Menu,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let presets = load_presets(cli.presets.as_deref())?;
    let config = PipelineConfig {
        target_size: cli.target_size,
        seed: cli.seed,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(&cli.data_root, config, presets).context("invalid configuration")?;

    match cli.cmd.unwrap_or(Command::Menu) {
        Command::Complete { preset } => complete(&pipeline, &preset),
        Command::Custom {
            train,
            test,
            name,
            strategy,
        } => custom(&pipeline, train, test, &name, &strategy),
        Command::Process { path } => process(&pipeline, &path),
        Command::Create { preset } => create(&pipeline, &preset),
        Command::Prototype => complete(&pipeline, "prototype"),
        Command::Development => complete(&pipeline, "development"),
        Command::Experiment => complete(&pipeline, "experiment"),
        Command::Demo => complete(&pipeline, "demo"),
        Command::List => {
            list(pipeline.presets());
            Ok(())
        }
        Command::Menu => menu::run(&pipeline),
    }
}

fn init_logging() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
}

fn load_presets(path: Option<&Path>) -> Result<PresetTable> {
    let mut table = PresetTable::builtin();
    if let Some(path) = path {
        let text = std::fs::read_to_string(path).with_context(|| format!("read presets: {path:?}"))?;
        let extra: PresetTable =
            serde_json::from_str(&text).with_context(|| format!("parse presets: {path:?}"))?;
        table
            .merge(extra)
            .with_context(|| format!("invalid preset in {path:?}"))?;
    }
    Ok(table)
}

pub(crate) fn complete(pipeline: &Pipeline, preset: &str) -> Result<()> {
    let report = pipeline
        .run_complete(preset)
        .with_context(|| format!("pipeline failed for preset {preset:?}"))?;
    print_pipeline(&report);
    Ok(())
}

pub(crate) fn custom(pipeline: &Pipeline, train: usize, test: usize, name: &str, strategy: &str) -> Result<()> {
    let strategy: SamplingStrategy = strategy.parse()?;
    let report = pipeline
        .run_custom(train, test, name, strategy)
        .with_context(|| format!("custom pipeline {name:?} failed"))?;
    print_pipeline(&report);
    Ok(())
}

pub(crate) fn process(pipeline: &Pipeline, path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!("dataset path does not exist: {path:?}");
    }
    let report = pipeline
        .run_processing_only(path)
        .with_context(|| format!("processing failed: {path:?}"))?;
    print_processing(&report);
    Ok(())
}

pub(crate) fn create(pipeline: &Pipeline, preset: &str) -> Result<()> {
    let report = pipeline
        .create_by_preset(preset)
        .with_context(|| format!("dataset creation failed for preset {preset:?}"))?;
    print_create(&report);
    Ok(())
}

pub(crate) fn list(presets: &PresetTable) {
    println!("{:<12} {:>6} {:>6}  {:<9} {:<20} description", "preset", "train", "test", "strategy", "output");
    for p in presets.iter() {
        println!(
            "{:<12} {:>6} {:>6}  {:<9} {:<20} {}",
            p.name, p.train_size, p.test_size, p.strategy, p.output_dir, p.description
        );
    }
}

fn print_create(report: &CreateReport) {
    for w in &report.warnings {
        println!("warning: {}", w.message);
    }
    let s = &report.subset;
    println!(
        "dataset {:?}: {} train, {} test, {} annotations",
        s.output, s.train_images, s.test_images, s.annotations
    );
}

fn print_pipeline(report: &PipelineReport) {
    for w in &report.warnings {
        println!("warning: {}", w.message);
    }
    println!("preset:         {}", report.preset.name);
    println!("source dataset: {:?}", report.subset.output);
    print_processing(&report.processing);
}

fn print_processing(report: &ProcessingReport) {
    let warnings = report.warnings().count();
    let pkg = &report.packaging;
    let validation = &report.validation;
    println!(
        "validation:     images {:.1}% valid, annotations {:.1}% valid",
        validation.images.valid_ratio() * 100.0,
        validation.annotations.valid_ratio() * 100.0
    );
    println!(
        "preprocessing:  {} processed, {} failed ({:.1}% success)",
        report.preprocessing.processed,
        report.preprocessing.failed,
        report.preprocessing.success_rate() * 100.0
    );
    let split: Vec<String> = Split::ALL
        .iter()
        .map(|&s| format!("{} {s}", report.split.count(s)))
        .collect();
    println!("split:          {}", split.join(" / "));
    println!("classes:        {}", report.conversion.total_classes());
    println!(
        "quality score:  {:.3} (balance {:.3})",
        report.analysis.quality_metrics.overall_quality_score,
        report.analysis.overall_stats.class_balance_score
    );
    println!("report:         {:?}", report.report_path);
    println!("package:        {:?}", pkg.archive_path);
    println!("package size:   {:.1} MB", pkg.package_size_mb);
    println!("ready:          {}", pkg.ready_for_delivery);
    if warnings > 0 {
        println!("{warnings} item warnings (see log)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn custom_arguments_default() {
        let cli = Cli::parse_from(["pillprep", "--seed", "7", "custom", "200", "100"]);
        assert_eq!(Some(7), cli.seed);
        match cli.cmd {
            Some(Command::Custom { train, test, name, strategy }) => {
                assert_eq!((200, 100), (train, test));
                assert_eq!(("custom", "balanced"), (name.as_str(), strategy.as_str()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
