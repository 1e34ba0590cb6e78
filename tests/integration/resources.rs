// tests/integration/resources.rs

use cycledag::compile;
use cycledag::graph::WorkflowGraph;
use cycledag::resources::ResourceSlot;
use cycledag::types::Mode;
use cycledag_test_utils::builders::ExperimentConfigBuilder;

use crate::common::generated_at;

fn cycled(builder: ExperimentConfigBuilder) -> WorkflowGraph {
    compile(&builder.build(), generated_at()).unwrap()
}

#[test]
fn slurm_routes_service_tasks_to_service_partition() {
    let graph = cycled(ExperimentConfigBuilder::new(Mode::Cycled));

    let fcst = &graph.entry("gdasfcst").unwrap().task().resources;
    assert_eq!(fcst.queue, "batch");
    assert_eq!(fcst.partition.as_deref(), Some("hera"));
    assert_eq!(fcst.native.as_deref(), Some("--export=NONE"));

    let arch = &graph.entry("gdasarch").unwrap().task().resources;
    assert_eq!(arch.queue, "batch");
    assert_eq!(arch.partition.as_deref(), Some("service"));
}

#[test]
fn pbspro_drops_partition_and_native_slots() {
    let graph = cycled(ExperimentConfigBuilder::new(Mode::Cycled).with("SCHEDULER", "pbspro"));

    let arch = graph.entry("gdasarch").unwrap().task();
    assert_eq!(arch.resources.queue, "service");
    assert!(arch.resources.partition.is_none());
    assert!(!arch.slots.contains(&ResourceSlot::Partition));
    assert!(!arch.slots.contains(&ResourceSlot::Native));
    assert!(arch.slots.contains(&ResourceSlot::Walltime));
}

#[test]
fn nodes_round_up_and_gfs_override_wins() {
    let graph = cycled(
        ExperimentConfigBuilder::new(Mode::Cycled)
            .with("gfs_cyc", 4_i64)
            .with("npe_fcst", 192_i64)
            .with("npe_fcst_gfs", 480_i64)
            .with("nth_fcst", 2_i64),
    );

    let gdas = &graph.entry("gdasfcst").unwrap().task().resources;
    assert_eq!((gdas.cores, gdas.ppn, gdas.nodes, gdas.threads), (192, 40, 5, 2));

    let gfs = &graph.entry("gfsfcst").unwrap().task().resources;
    assert_eq!((gfs.cores, gfs.nodes), (480, 12));
}

#[test]
fn task_section_overrides_base_settings() {
    let graph = cycled(
        ExperimentConfigBuilder::new(Mode::Cycled)
            .with_task("fcst", "wtime_fcst", "02:00:00")
            .with_task("fcst", "memory_fcst", "96GB"),
    );

    let fcst = graph.entry("gdasfcst").unwrap().task();
    assert_eq!(fcst.resources.walltime, "02:00:00");
    assert_eq!(fcst.resources.memory.as_deref(), Some("96GB"));
    assert!(fcst.slots.contains(&ResourceSlot::Memory));

    let post = graph.entry("gdaspost").unwrap().task();
    assert_eq!(post.resources.walltime, "00:30:00");
    assert!(!post.slots.contains(&ResourceSlot::Memory));
}

#[test]
fn workflow_settings_come_from_base() {
    let graph = cycled(
        ExperimentConfigBuilder::new(Mode::Cycled)
            .with("CYCLETHROTTLE", 3_i64)
            .with("MAXTRIES", 4_i64),
    );

    assert_eq!(graph.settings.cycle_throttle, 3);
    assert_eq!(graph.settings.task_throttle, 25);
    assert!(graph.entries().all(|e| e.task().max_tries == 4));
}
