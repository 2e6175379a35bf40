use std::fs;

use task_schedule_optimizer::{AppError, OptimizerConfig};
use tempfile::tempdir;

#[test]
fn loads_yaml_config_and_fills_missing_fields_with_defaults() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("optimizer.yaml");
    fs::write(
        &path,
        "lookaheadDays: 14\ntimeBudgetMs: 1500\nfixedPriorityThreshold: 3\n",
    )
    .expect("write yaml");

    let config = OptimizerConfig::load(&path).expect("load yaml");

    assert_eq!(config.lookahead_days, 14);
    assert_eq!(config.time_budget_ms, 1500);
    assert_eq!(config.fixed_priority_threshold, 3);
    assert_eq!(config.slot_granularity_minutes, 30);
    assert_eq!(config.max_iterations, 100);
}

#[test]
fn loads_json_config_for_any_other_extension() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("optimizer.json");
    fs::write(&path, r#"{"maxIterations": 25, "repairStepMinutes": 15}"#).expect("write json");

    let config = OptimizerConfig::load(&path).expect("load json");

    assert_eq!(config.max_iterations, 25);
    assert_eq!(config.repair_step_minutes, 15);
    assert_eq!(config.lookahead_days, 7);
}

#[test]
fn rejects_out_of_range_values_as_config_errors() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("broken.yml");
    fs::write(&path, "slotGranularityMinutes: 0\n").expect("write yaml");

    let err = OptimizerConfig::load(&path).expect_err("zero granularity is invalid");

    assert!(matches!(err, AppError::Config { .. }), "{err:?}");
    assert!(err.to_string().contains("slotGranularityMinutes"));
}

#[test]
fn malformed_documents_surface_parser_errors() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("optimizer.json");
    fs::write(&path, "{ not json").expect("write json");

    let err = OptimizerConfig::load(&path).expect_err("malformed json");

    assert!(matches!(err, AppError::Serialization(_)), "{err:?}");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().expect("temp dir");
    let err = OptimizerConfig::load(dir.path().join("absent.yaml")).expect_err("missing file");

    assert!(matches!(err, AppError::Io(_)), "{err:?}");
}
