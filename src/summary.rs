// src/summary.rs

//! Human-readable views of a compiled graph and of a task plan.

use std::fmt::Write;

use crate::calendar::{Calendar, format_ymdh};
use crate::catalog::TaskPlan;
use crate::graph::{GraphEntry, WorkflowGraph};

/// Cadences, then every entry with its resources and dependency tree.
pub fn render_summary(graph: &WorkflowGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "cycledag graph ({})", graph.mode);
    let _ = writeln!(
        out,
        "  pslot = {}, generated at {}",
        graph.provenance.pslot,
        graph.provenance.generated_at.format("%Y-%m-%dT%H:%M:%SZ")
    );
    let s = &graph.settings;
    let _ = writeln!(
        out,
        "  cyclethrottle = {}, taskthrottle = {}, maxtries = {}",
        s.cycle_throttle, s.task_throttle, s.max_tries
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "cadences ({}):", graph.cadences.len());
    for c in &graph.cadences {
        let _ = writeln!(
            out,
            "  - {}: {} .. {} every {}",
            c.id,
            format_ymdh(c.start),
            format_ymdh(c.end),
            c.interval_hms()
        );
    }

    for group in &graph.groups {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({} entries):", group.group, group.entries.len());
        for entry in &group.entries {
            let node = entry.task();
            match entry {
                GraphEntry::Task(_) => {
                    let _ = writeln!(out, "  - {} [{}]", node.name, node.cadence);
                }
                GraphEntry::Metatask(m) => {
                    let _ = writeln!(
                        out,
                        "  - {} [{}] over {} = {}",
                        m.name,
                        node.cadence,
                        m.var,
                        m.values.join(" ")
                    );
                    let _ = writeln!(out, "      member: {}", node.name);
                }
            }
            let r = &node.resources;
            let _ = writeln!(
                out,
                "      resources: {} cores on {} nodes ({} ppn, {} threads), {} queue {}",
                r.cores, r.nodes, r.ppn, r.threads, r.walltime, r.queue
            );
            if let Some(dep) = &node.dependency {
                let _ = writeln!(out, "      after: {dep}");
            }
        }
    }
    out
}

/// Ordered tasks per group, as `--dry-run` prints them.
pub fn render_plan(calendar: &Calendar, plan: &TaskPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "cycledag dry-run ({})", calendar.config().mode());
    for c in calendar.cadences() {
        let _ = writeln!(
            out,
            "  cadence {}: {} .. {} every {}",
            c.id,
            format_ymdh(c.start),
            format_ymdh(c.end),
            c.interval_hms()
        );
    }
    if let Some(secondary) = calendar.secondary().filter(|s| !s.cadence.valid) {
        let _ = writeln!(
            out,
            "  cadence {} disabled (starts after EDATE)",
            secondary.cadence.id
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "tasks ({}):", plan.task_count());
    for group in plan.groups() {
        for task in &group.tasks {
            let _ = writeln!(out, "  - {}{}", group.group.label(), task);
        }
    }
    out
}
