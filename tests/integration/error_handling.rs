// tests/integration/error_handling.rs

use cycledag::compile;
use cycledag::config::load_and_validate;
use cycledag::errors::CycledagError;
use cycledag::types::Mode;
use cycledag_test_utils::builders::ExperimentConfigBuilder;

use crate::common::{config_file, generated_at};

#[test]
fn unknown_mode_returns_structured_error() {
    let file = config_file(
        r#"
[base]
MODE = "hindcast"
SDATE = "2021122018"
EDATE = "2021122500"
SCHEDULER = "slurm"
"#,
    );

    match load_and_validate(file.path()) {
        Err(CycledagError::UnknownMode(mode)) => assert_eq!(mode, "hindcast"),
        Err(e) => panic!("Expected UnknownMode error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn reversed_window_returns_config_error() {
    let file = config_file(
        r#"
[base]
MODE = "cycled"
SDATE = "2021122500"
EDATE = "2021122018"
SCHEDULER = "slurm"
"#,
    );

    match load_and_validate(file.path()) {
        Err(CycledagError::ConfigError(msg)) => {
            assert!(msg.contains("SDATE"));
            assert!(msg.contains("must not be later"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_returns_toml_error() {
    let file = config_file("[base\nMODE = \"cycled\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(CycledagError::TomlError(_))
    ));
}

#[test]
fn missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("absent.toml")),
        Err(CycledagError::IoError(_))
    ));
}

#[test]
fn missing_pslot_names_the_key() {
    let cfg = ExperimentConfigBuilder::new(Mode::Cycled)
        .without("PSLOT")
        .build();

    match compile(&cfg, generated_at()) {
        Err(CycledagError::MissingKey { key, .. }) => assert_eq!(key, "PSLOT"),
        other => panic!("Expected MissingKey, got: {:?}", other),
    }
}

#[test]
fn missing_walltime_names_task_section() {
    let cfg = ExperimentConfigBuilder::new(Mode::Cycled)
        .without_default_resources()
        .build();

    match compile(&cfg, generated_at()) {
        Err(CycledagError::MissingKey { scope, key }) => {
            assert_eq!(scope, "[task.prep]");
            assert_eq!(key, "wtime_prep");
        }
        other => panic!("Expected MissingKey, got: {:?}", other),
    }
}

#[test]
fn zero_core_count_is_invalid() {
    let cfg = ExperimentConfigBuilder::new(Mode::Cycled)
        .with("npe_fcst", 0_i64)
        .build();

    match compile(&cfg, generated_at()) {
        Err(CycledagError::InvalidValue { key, value, .. }) => {
            assert_eq!(key, "npe_fcst");
            assert_eq!(value, "0");
        }
        other => panic!("Expected InvalidValue, got: {:?}", other),
    }
}

#[test]
fn unsupported_gfs_frequency_is_invalid() {
    let cfg = ExperimentConfigBuilder::new(Mode::Cycled)
        .with("gfs_cyc", 3_i64)
        .build();

    assert!(matches!(
        compile(&cfg, generated_at()),
        Err(CycledagError::InvalidValue { ref key, .. }) if key == "gfs_cyc"
    ));
}

#[test]
fn ens_regrid_requires_cycle_frequency() {
    let cfg = ExperimentConfigBuilder::new(Mode::EnsRegrid)
        .without("CYCLE_FREQ")
        .build();

    assert!(matches!(
        compile(&cfg, generated_at()),
        Err(CycledagError::MissingKey { ref key, .. }) if key == "CYCLE_FREQ"
    ));
}

#[test]
fn zero_max_tries_is_rejected() {
    let cfg = ExperimentConfigBuilder::new(Mode::Omf)
        .with("MAXTRIES", 0_i64)
        .build();

    assert!(matches!(
        compile(&cfg, generated_at()),
        Err(CycledagError::InvalidValue { ref key, .. }) if key == "MAXTRIES"
    ));
}
