use pillprep_core::config::{DatasetPreset, PipelineConfig, PresetTable, DEFAULT_PRESET};
use pillprep_core::sample::SamplingStrategy;
use pillprep_core::split::SplitRatios;

#[test]
fn builtin_presets_match_the_documented_table() {
    let table = PresetTable::builtin();
    let expected = [
        ("prototype", 50, 25, SamplingStrategy::Random),
        ("development", 150, 75, SamplingStrategy::Balanced),
        ("experiment", 300, 150, SamplingStrategy::Quality),
        ("validation", 500, 250, SamplingStrategy::Balanced),
        ("demo", 100, 50, SamplingStrategy::Quality),
        ("analysis", 200, 100, SamplingStrategy::Balanced),
    ];
    assert_eq!(expected.len(), table.iter().count());
    for (name, train, test, strategy) in expected {
        let p = table.get(name).unwrap();
        assert_eq!((train, test, strategy), (p.train_size, p.test_size, p.strategy));
        assert_eq!(format!("{name}_data"), p.output_dir);
    }
}

#[test]
fn unknown_preset_falls_back_with_warning() {
    let table = PresetTable::builtin();
    let resolved = table.resolve("huge").unwrap();
    assert_eq!(DEFAULT_PRESET, resolved.preset.name);
    assert_eq!("unknown_preset", resolved.warning.unwrap().code);

    let exact = table.resolve("demo").unwrap();
    assert_eq!("demo", exact.preset.name);
    assert!(exact.warning.is_none());
}

#[test]
fn presets_load_from_json_and_override_builtins() {
    let json = r#"[
        {"name": "demo", "train_size": 10, "test_size": 5, "output_dir": "tiny", "strategy": "random"},
        {"name": "night", "train_size": 20, "test_size": 8, "output_dir": "night_data", "strategy": "quality", "description": "overnight"}
    ]"#;
    let extra: PresetTable = serde_json::from_str(json).unwrap();
    let mut table = PresetTable::builtin();
    table.merge(extra).unwrap();

    let demo = table.get("demo").unwrap();
    assert_eq!((10, "tiny"), (demo.train_size, demo.output_dir.as_str()));
    assert_eq!(SamplingStrategy::Quality, table.get("night").unwrap().strategy);
    assert_eq!(7, table.iter().count());
}

#[test]
fn zero_sized_preset_is_rejected() {
    let mut table = PresetTable::builtin();
    let bad = DatasetPreset::new("empty", 0, 5, SamplingStrategy::Random, "");
    assert!(table.insert(bad).unwrap_err().is_config());
}

#[test]
fn pipeline_config_defaults_validate() {
    let cfg = PipelineConfig::default();
    assert_eq!(1280, cfg.target_size);
    assert!(cfg.validate().is_ok());
    assert_eq!(100, cfg.analysis().image_sample_cap);

    let bad = PipelineConfig {
        ratios: SplitRatios {
            train: 0.5,
            val: 0.1,
            test: 0.1,
        },
        ..PipelineConfig::default()
    };
    assert!(bad.validate().is_err());
}
