// tests/property/graph_order.rs

use std::collections::HashSet;

use cycledag::compile;
use cycledag::types::{CycleGroup, Mode};
use cycledag_test_utils::builders::ExperimentConfigBuilder;
use proptest::prelude::*;

use crate::common::generated_at;

fn cycled_strategy() -> impl Strategy<Value = ExperimentConfigBuilder> {
    (
        prop_oneof![Just(0i64), Just(1), Just(2), Just(4)],
        0i64..4,
        0i64..12,
        any::<bool>(),
        1i64..6,
    )
        .prop_map(|(gfs_cyc, start_cycle, length, hybvar, npostgrp)| {
            let sdate = format!("20211220{:02}", start_cycle * 6);
            let end_hour = 20 * 24 + start_cycle * 6 + length * 6;
            let edate = format!("202112{:02}{:02}", end_hour / 24, end_hour % 24);
            ExperimentConfigBuilder::new(Mode::Cycled)
                .with("SDATE", sdate)
                .with("EDATE", edate)
                .with("gfs_cyc", gfs_cyc)
                .with("DOHYBVAR", hybvar)
                .with("NPOSTGRP", npostgrp)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cycled_graphs_compile_with_gdas_first(builder in cycled_strategy()) {
        let graph = compile(&builder.build(), generated_at()).unwrap();

        prop_assert_eq!(graph.groups[0].group, CycleGroup::Gdas);
        prop_assert!(graph.groups.len() <= 2);

        // Names are unique across the whole graph.
        let mut seen = HashSet::new();
        for name in graph.names() {
            prop_assert!(seen.insert(name), "duplicate entry {}", name);
        }
    }

    #[test]
    fn metatask_tables_match_values(builder in cycled_strategy()) {
        let graph = compile(&builder.build(), generated_at()).unwrap();

        for entry in graph.entries() {
            if let cycledag::graph::GraphEntry::Metatask(m) = entry {
                prop_assert!(!m.values.is_empty());
                for table in m.side_tables.values() {
                    prop_assert_eq!(table.len(), m.values.len());
                }
            }
        }
    }
}
