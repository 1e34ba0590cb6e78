// tests/integration/load_from_file.rs

use cycledag::compile;
use cycledag::config::load_and_validate;
use cycledag::types::Mode;
use cycledag_test_utils::builders::ExperimentConfigBuilder;

use crate::common::{config_file, generated_at};

#[test]
fn file_round_trip_matches_builder() {
    let builder = ExperimentConfigBuilder::new(Mode::ForecastOnly)
        .with("gfs_cyc", 2_i64)
        .with_task("fcst", "npe_fcst", 80_i64);
    let file = config_file(&builder.to_toml());

    let from_file = compile(&load_and_validate(file.path()).unwrap(), generated_at()).unwrap();
    let from_builder = compile(&builder.build(), generated_at()).unwrap();
    assert_eq!(from_file, from_builder);

    let fcst = &from_file.entry("gfsfcst").unwrap().task().resources;
    assert_eq!((fcst.cores, fcst.nodes), (80, 2));
}

#[test]
fn mode_is_inferred_from_cycle_frequency() {
    let file = config_file(
        r#"
[base]
CYCLE_FREQ = 2
SDATE = "2022010100"
EDATE = "2022010300"
SCHEDULER = "lsf"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.mode(), Mode::EnsRegrid);
}

#[test]
fn flags_accept_shell_style_values() {
    let file = config_file(
        r#"
[base]
MODE = "forecast_only"
SDATE = 2021122000
EDATE = 2021122100
SCHEDULER = "slurm"
EXP_WARM_START = ".true."
HPSSARCH = "YES"
DO_POST = false
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.mode(), Mode::ForecastOnly);

    let calendar = cycledag::calendar::Calendar::derive(&cfg).unwrap();
    let plan = cycledag::catalog::TaskCatalog::new(&calendar).unwrap().plan();
    assert_eq!(plan.task_count(), 3);
}
