// src/graph/assembler.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::calendar::Calendar;
use crate::catalog::TaskSpec;
use crate::config::ConfigScope;
use crate::errors::{CycledagError, Result};
use crate::graph::{
    GraphEntry, MetataskNode, Provenance, TaskGroup, TaskNode, WorkflowGraph, WorkflowSettings,
    filter, validate,
};
use crate::resources::{ResourceDescriptor, ResourceResolver, ResourceSlot};

/// Experiment roots copied into the graph bindings when `[base]` sets them.
const ROOT_KEYS: &[&str] = &["ROTDIR", "ICSDIR", "DMPDIR", "EXPDIR", "HOMEgfs"];

/// Build, filter and validate the graph for described tasks.
///
/// `specs` must be in catalog order; groups keep the order in which they
/// first appear.
pub fn assemble(
    calendar: &Calendar,
    specs: Vec<TaskSpec>,
    generated_at: DateTime<Utc>,
) -> Result<WorkflowGraph> {
    let config = calendar.config();
    let base = config.base();
    let resolver = ResourceResolver::new(config)?;
    let settings = settings(base)?;
    let bindings = bindings(base)?;
    let pslot = bindings.get("PSLOT").cloned().unwrap_or_default();

    let mut groups: Vec<TaskGroup> = Vec::new();
    for spec in specs {
        let resources = resolver.resolve(spec.task, spec.group)?;
        let entry = entry_for(spec, resources, settings.max_tries);
        debug!(entry = entry.name(), "assembled entry");

        let group = entry.task().group;
        match groups.iter_mut().find(|g| g.group == group) {
            Some(g) => g.entries.push(entry),
            None => groups.push(TaskGroup {
                group,
                entries: vec![entry],
            }),
        }
    }

    let mut graph = WorkflowGraph {
        mode: config.mode(),
        provenance: Provenance {
            generated_at,
            pslot,
        },
        bindings,
        settings,
        cadences: calendar
            .cadences()
            .iter()
            .filter(|c| c.valid)
            .cloned()
            .collect(),
        groups,
    };

    filter::strip_absent_slots(&mut graph);
    validate::validate_graph(&graph)?;

    info!(
        mode = %graph.mode,
        cadences = graph.cadences.len(),
        entries = graph.entry_count(),
        "assembled workflow graph"
    );
    Ok(graph)
}

fn entry_for(
    spec: TaskSpec,
    resources: ResourceDescriptor,
    max_tries: u32,
) -> GraphEntry {
    let stem = spec.task.as_str();
    let name = match &spec.fan_out {
        Some(fan_out) => format!("{}${{{}}}", spec.name(), fan_out.var),
        None => spec.name(),
    };
    let node = TaskNode {
        command: format!("${{JOBS_DIR}}/{stem}.sh"),
        job_name: format!("${{PSLOT}}_{name}_${{HH}}"),
        log: format!("${{ROTDIR}}/logs/${{CDATE}}/{name}.log"),
        name,
        task: spec.task,
        group: spec.group,
        cadence: spec.cadence,
        max_tries,
        env: spec.env,
        dependency: spec.dependency,
        resources,
        slots: ResourceSlot::ALL.to_vec(),
    };
    match spec.fan_out {
        Some(fan_out) => GraphEntry::Metatask(MetataskNode {
            name: fan_out.metatask,
            var: fan_out.var,
            values: fan_out.values,
            side_tables: fan_out.side_tables,
            task: node,
        }),
        None => GraphEntry::Task(node),
    }
}

fn settings(base: &ConfigScope) -> Result<WorkflowSettings> {
    let defaults = WorkflowSettings::default();
    let settings = WorkflowSettings {
        cycle_throttle: base.count("CYCLETHROTTLE")?.unwrap_or(defaults.cycle_throttle),
        task_throttle: base.count("TASKTHROTTLE")?.unwrap_or(defaults.task_throttle),
        max_tries: base.count("MAXTRIES")?.unwrap_or(defaults.max_tries),
    };
    if settings.max_tries == 0 {
        return Err(CycledagError::invalid("MAXTRIES", "0", "at least one attempt"));
    }
    Ok(settings)
}

/// Placeholder values shared by every task.
fn bindings(base: &ConfigScope) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    let pslot = base
        .string("PSLOT")
        .ok_or_else(|| CycledagError::missing("[base]", "PSLOT"))?;
    out.insert("PSLOT".to_string(), pslot);

    for key in ROOT_KEYS {
        if let Some(value) = base.string(key) {
            out.insert(key.to_string(), value);
        }
    }
    let jobs_dir = base
        .string("BASE_JOB")
        .unwrap_or_else(|| "${HOMEgfs}/jobs/rocoto".to_string());
    out.insert("JOBS_DIR".to_string(), jobs_dir);
    out.insert("RUN_ENVIR".to_string(), base.string_or("RUN_ENVIR", "emc"));

    let archive = if base.flag("HPSSARCH", false)? { "YES" } else { "NO" };
    out.insert("ARCHIVE_TO_HPSS".to_string(), archive.to_string());
    Ok(out)
}
