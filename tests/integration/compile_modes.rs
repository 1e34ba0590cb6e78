// tests/integration/compile_modes.rs

use cycledag::compile;
use cycledag::graph::GraphEntry;
use cycledag::summary::render_summary;
use cycledag::types::{CadenceId, CycleGroup, Mode};
use cycledag_test_utils::builders::ExperimentConfigBuilder;
use cycledag_test_utils::init_tracing;

use crate::common::generated_at;

#[test]
fn every_mode_compiles_with_defaults() {
    init_tracing();

    for mode in Mode::ALL {
        let cfg = ExperimentConfigBuilder::new(mode).build();
        let graph = compile(&cfg, generated_at())
            .unwrap_or_else(|e| panic!("mode {mode} failed to compile: {e:?}"));
        assert_eq!(graph.mode, mode);
        assert!(graph.entry_count() > 0, "mode {mode} produced no entries");
        assert_eq!(graph.provenance.pslot, "c96test");
        assert!(graph.cadences.iter().all(|c| c.valid));
    }
}

#[test]
fn compilation_is_deterministic() {
    let cfg = ExperimentConfigBuilder::new(Mode::Cycled)
        .with("gfs_cyc", 4_i64)
        .with("DOHYBVAR", "YES")
        .build();

    let a = compile(&cfg, generated_at()).unwrap();
    let b = compile(&cfg, generated_at()).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn cycled_gdas_group_precedes_gfs() {
    let cfg = ExperimentConfigBuilder::new(Mode::Cycled)
        .with("gfs_cyc", 4_i64)
        .build();
    let graph = compile(&cfg, generated_at()).unwrap();

    let groups: Vec<_> = graph.groups.iter().map(|g| g.group).collect();
    assert_eq!(groups, vec![CycleGroup::Gdas, CycleGroup::Gfs]);
    assert_eq!(graph.names()[0], "gdasprep");
    assert_eq!(graph.names().last().copied(), Some("gfsarch"));
    assert!(graph.cadence(CadenceId::Gfs).is_some());

    let fcst = graph.entry("gfsfcst").unwrap();
    assert_eq!(fcst.task().cadence, CadenceId::Gfs);
    assert_eq!(fcst.task().command, "${JOBS_DIR}/fcst.sh");
    assert_eq!(fcst.task().job_name, "${PSLOT}_gfsfcst_${HH}");
}

#[test]
fn secondary_cadence_after_window_end_is_dropped() {
    let cfg = ExperimentConfigBuilder::new(Mode::Cycled)
        .with("EDATE", "2021122018")
        .with("gfs_cyc", 1_i64)
        .build();
    let graph = compile(&cfg, generated_at()).unwrap();

    assert!(graph.cadence(CadenceId::Gfs).is_none());
    assert!(graph.groups.iter().all(|g| g.group == CycleGroup::Gdas));
}

#[test]
fn post_is_a_metatask_over_hour_groups() {
    let cfg = ExperimentConfigBuilder::new(Mode::Cycled)
        .with("NPOSTGRP", 2_i64)
        .build();
    let graph = compile(&cfg, generated_at()).unwrap();

    let Some(GraphEntry::Metatask(post)) = graph.entry("gdaspost") else {
        panic!("gdaspost should be a metatask");
    };
    assert_eq!(post.var, "grp");
    assert_eq!(post.values, vec!["001", "002"]);
    assert_eq!(post.side_tables["dep"], vec!["f003", "f009"]);
    assert_eq!(post.task.name, "gdaspost${grp}");
}

#[test]
fn replay_increment_initialises_on_first_cycle_only() {
    let cfg = ExperimentConfigBuilder::new(Mode::Replay)
        .with("replay", 2_i64)
        .build();
    let graph = compile(&cfg, generated_at()).unwrap();

    let first = graph.cadence(CadenceId::First).unwrap();
    assert_eq!(first.start, first.end);
    assert_eq!(graph.entry("gdasinit").unwrap().task().cadence, CadenceId::First);
    assert!(graph.entry("gdasanalinc").is_some());
}

#[test]
fn archive_flag_becomes_binding() {
    let cfg = ExperimentConfigBuilder::new(Mode::ForecastOnly)
        .with("HPSSARCH", "YES")
        .build();
    let graph = compile(&cfg, generated_at()).unwrap();

    assert_eq!(graph.bindings["ARCHIVE_TO_HPSS"], "YES");
    assert_eq!(graph.bindings["PSLOT"], "c96test");
    assert_eq!(graph.names()[0], "gfsgetic");
}

#[test]
fn summary_lists_cadences_and_dependencies() {
    let cfg = ExperimentConfigBuilder::new(Mode::Omf).build();
    let graph = compile(&cfg, generated_at()).unwrap();
    let text = render_summary(&graph);

    assert!(text.starts_with("cycledag graph (omf)"));
    assert!(text.contains("cadences (1):"));
    assert!(text.contains("  - gdasgomg [gdas]"));
    assert!(text.contains("after: task gdasprep"));
}

#[test]
fn json_tags_entry_kinds() {
    let cfg = ExperimentConfigBuilder::new(Mode::EnsRegrid).build();
    let graph = compile(&cfg, generated_at()).unwrap();
    let value = serde_json::to_value(&graph).unwrap();

    let entries = value["groups"][0]["entries"].as_array().unwrap();
    let kinds: Vec<_> = entries.iter().map(|e| e["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["metatask", "metatask", "task", "task"]);
    assert_eq!(value["mode"], "ens-regrid");
}
