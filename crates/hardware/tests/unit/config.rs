//! # Configuration Tests
//!
//! Defaults, JSON loading from disk and range validation.

use std::io::Write;

use pretty_assertions::assert_eq;
use rstest::rstest;
use sspsim_core::common::error::ConfigError;
use sspsim_core::config::{Config, PredictorKind};
use tempfile::NamedTempFile;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_default_config_validates() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.pipeline.issue_width, 4);
    assert_eq!(config.pipeline.rob_size, 32);
    assert!(config.forwarding.enabled);
}

#[test]
fn test_from_file_partial_sections() {
    let file = write_config(
        r#"{
            "pipeline": { "issue_width": 2, "rob_size": 8 },
            "units": { "alu": { "count": 3 }, "latencies": { "MUL": 6 } },
            "branch_predictor": { "type": "gshare", "history_length": 4 }
        }"#,
    );
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.pipeline.issue_width, 2);
    assert_eq!(config.pipeline.rob_size, 8);
    assert_eq!(config.pipeline.rs_size, Config::default().pipeline.rs_size);
    assert_eq!(config.units.alu.count, 3);
    assert_eq!(config.branch_predictor.kind, PredictorKind::Gshare);
    assert_eq!(config.branch_predictor.history_length, 4);
    let overrides = config.units.latency_overrides().unwrap();
    assert_eq!(overrides.len(), 1);
}

#[test]
fn test_round_trip_through_file() {
    let config = Config::default();
    let file = write_config(&config.to_json_pretty().unwrap());
    assert_eq!(Config::from_file(file.path()).unwrap(), config);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_json() {
    let file = write_config("{ \"pipeline\": ");
    assert!(matches!(
        Config::from_file(file.path()),
        Err(ConfigError::Json(_))
    ));
}

#[rstest]
#[case::zero_issue_width(r#"{ "pipeline": { "issue_width": 0 } }"#)]
#[case::wide_issue(r#"{ "pipeline": { "issue_width": 9 } }"#)]
#[case::empty_rob(r#"{ "pipeline": { "rob_size": 0 } }"#)]
#[case::no_alus(r#"{ "units": { "alu": { "count": 0 } } }"#)]
#[case::odd_predictor(r#"{ "branch_predictor": { "num_entries": 1000 } }"#)]
#[case::unknown_latency(r#"{ "units": { "latencies": { "FROB": 2 } } }"#)]
#[case::zero_latency(r#"{ "units": { "latencies": { "ADD": 0 } } }"#)]
fn test_invalid_values_rejected(#[case] json: &str) {
    assert!(matches!(
        Config::from_json_str(json),
        Err(ConfigError::Invalid(_))
    ));
}
