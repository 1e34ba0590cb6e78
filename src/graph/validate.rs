// src/graph/validate.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::catalog::EnvValue;
use crate::depend::{CYCLE_FIELDS, PathTemplate, Predicate};
use crate::errors::{CycledagError, Result};
use crate::graph::{GraphEntry, WorkflowGraph};

pub fn validate_graph(graph: &WorkflowGraph) -> Result<()> {
    validate_bindings(&graph.bindings)?;
    validate_references(graph)?;
    validate_placeholders(graph)?;
    validate_same_cycle_order(graph)?;
    Ok(())
}

fn validate_bindings(bindings: &BTreeMap<String, String>) -> Result<()> {
    for (name, value) in bindings {
        for placeholder in PathTemplate::new(value.as_str()).placeholders() {
            if !CYCLE_FIELDS.contains(&placeholder) && !bindings.contains_key(placeholder) {
                return Err(CycledagError::ConfigError(format!(
                    "binding '{name}' uses unknown placeholder '${{{placeholder}}}'"
                )));
            }
        }
    }
    Ok(())
}

/// Every task and metatask reference names an entry of the right kind.
fn validate_references(graph: &WorkflowGraph) -> Result<()> {
    let mut tasks = BTreeSet::new();
    let mut metatasks = BTreeSet::new();
    for entry in graph.entries() {
        match entry {
            GraphEntry::Task(t) => tasks.insert(t.name.as_str()),
            GraphEntry::Metatask(m) => metatasks.insert(m.name.as_str()),
        };
    }

    for entry in graph.entries() {
        let Some(dep) = &entry.task().dependency else {
            continue;
        };
        for leaf in dep.leaves() {
            let Some((reference, _)) = leaf.reference() else {
                continue;
            };
            let known = if leaf.is_metatask() {
                metatasks.contains(reference)
            } else {
                tasks.contains(reference)
            };
            if !known {
                return Err(CycledagError::UnknownReference {
                    task: entry.name().to_string(),
                    reference: reference.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Placeholders resolve to a cycle field, a binding or a variable of the
/// owning metatask.
fn validate_placeholders(graph: &WorkflowGraph) -> Result<()> {
    for entry in graph.entries() {
        let node = entry.task();
        let mut allowed: BTreeSet<&str> = CYCLE_FIELDS.iter().copied().collect();
        allowed.extend(graph.bindings.keys().map(String::as_str));
        if let GraphEntry::Metatask(m) = entry {
            allowed.extend(m.variables());
        }

        let mut texts: Vec<(&str, &str)> = vec![
            ("name", node.name.as_str()),
            ("command", node.command.as_str()),
            ("job name", node.job_name.as_str()),
            ("log", node.log.as_str()),
        ];
        for binding in &node.env {
            if let EnvValue::Text { value } = &binding.value {
                texts.push((binding.name.as_str(), value.as_str()));
            }
        }
        if let Some(dep) = &node.dependency {
            for leaf in dep.leaves() {
                match leaf {
                    Predicate::Data(check) => {
                        texts.extend(check.templates().map(|t| ("data dependency", t.as_str())));
                    }
                    Predicate::StrEq { left, right } => {
                        texts.push(("string comparison", left.as_str()));
                        texts.push(("string comparison", right.as_str()));
                    }
                    _ => {}
                }
            }
        }

        for (what, text) in texts {
            let template = PathTemplate::new(text);
            if let Some(unknown) = template
                .placeholders()
                .into_iter()
                .find(|p| !allowed.contains(p))
            {
                return Err(CycledagError::ConfigError(format!(
                    "task '{}' uses unknown placeholder '${{{unknown}}}' in its {what}",
                    entry.name()
                )));
            }
        }
    }
    Ok(())
}

/// Same-cycle references must not loop.
///
/// Edge direction: referenced entry -> dependent entry. References with a
/// non-zero offset point at another cycle and never close a loop within
/// one cycle.
fn validate_same_cycle_order(graph: &WorkflowGraph) -> Result<()> {
    let mut order: DiGraphMap<&str, ()> = DiGraphMap::new();
    for entry in graph.entries() {
        order.add_node(entry.name());
    }
    for entry in graph.entries() {
        let Some(dep) = &entry.task().dependency else {
            continue;
        };
        for (reference, offset) in dep.leaves().into_iter().filter_map(Predicate::reference) {
            if offset.is_none_or(|d| d == Duration::zero()) {
                order.add_edge(reference, entry.name(), ());
            }
        }
    }

    match toposort(&order, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(CycledagError::DependencyCycle(format!(
            "same-cycle dependencies loop through '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::catalog::{EnvBinding, TaskKind};
    use crate::depend::{DataCheck, Dependency};
    use crate::graph::{MetataskNode, Provenance, TaskGroup, TaskNode, WorkflowSettings};
    use crate::resources::{ResourceDescriptor, ResourceSlot};
    use crate::types::{CycleGroup, Mode};

    fn node(name: &str, dependency: Option<Dependency>) -> TaskNode {
        TaskNode {
            name: name.to_string(),
            task: TaskKind::Fcst,
            group: CycleGroup::Gdas,
            cadence: CycleGroup::Gdas.default_cadence(),
            command: "${JOBS_DIR}/fcst.sh".into(),
            job_name: format!("${{PSLOT}}_{name}_${{HH}}"),
            log: format!("${{ROTDIR}}/logs/${{CDATE}}/{name}.log"),
            max_tries: 2,
            env: vec![EnvBinding::text("HOMEgfs", "${HOMEgfs}")],
            dependency,
            resources: ResourceDescriptor {
                account: "fv3-cpu".into(),
                walltime: "00:10:00".into(),
                cores: 1,
                ppn: 1,
                nodes: 1,
                threads: 1,
                memory: None,
                native: None,
                queue: "batch".into(),
                partition: None,
            },
            slots: ResourceSlot::ALL.to_vec(),
        }
    }

    fn graph(entries: Vec<GraphEntry>) -> WorkflowGraph {
        let bindings = [
            ("PSLOT", "test"),
            ("ROTDIR", "/scratch/test"),
            ("HOMEgfs", "/home/gfs"),
            ("JOBS_DIR", "${HOMEgfs}/jobs/rocoto"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        WorkflowGraph {
            mode: Mode::Cycled,
            provenance: Provenance {
                generated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                pslot: "test".into(),
            },
            bindings,
            settings: WorkflowSettings::default(),
            cadences: Vec::new(),
            groups: vec![TaskGroup {
                group: CycleGroup::Gdas,
                entries,
            }],
        }
    }

    #[test]
    fn accepts_chain_with_previous_cycle_loop() {
        let g = graph(vec![
            GraphEntry::Task(node(
                "gdasprep",
                Some(Dependency::peer_at("gdasfcst", -Duration::hours(6))),
            )),
            GraphEntry::Task(node("gdasfcst", Some(Dependency::peer("gdasprep")))),
        ]);
        validate_graph(&g).unwrap();
    }

    #[test]
    fn rejects_unknown_reference() {
        let g = graph(vec![GraphEntry::Task(node(
            "gdasfcst",
            Some(Dependency::peer("gdassfcanl")),
        ))]);
        let err = validate_graph(&g).unwrap_err();
        assert!(matches!(
            err,
            CycledagError::UnknownReference { ref task, ref reference }
                if task == "gdasfcst" && reference == "gdassfcanl"
        ));
    }

    #[test]
    fn task_reference_does_not_match_metatask() {
        let post = MetataskNode {
            name: "gdaspost".into(),
            var: "grp".into(),
            values: vec!["001".into()],
            side_tables: Default::default(),
            task: node("gdaspost${grp}", None),
        };
        let g = graph(vec![
            GraphEntry::Metatask(post),
            GraphEntry::Task(node("gdasarch", Some(Dependency::peer("gdaspost")))),
        ]);
        assert!(matches!(
            validate_graph(&g),
            Err(CycledagError::UnknownReference { .. })
        ));
    }

    #[test]
    fn rejects_same_cycle_loop() {
        let g = graph(vec![
            GraphEntry::Task(node("gdasprep", Some(Dependency::peer("gdasfcst")))),
            GraphEntry::Task(node("gdasfcst", Some(Dependency::peer("gdasprep")))),
        ]);
        assert!(matches!(
            validate_graph(&g),
            Err(CycledagError::DependencyCycle(_))
        ));
    }

    #[test]
    fn rejects_unknown_placeholder_outside_fan_out() {
        let dep = Dependency::artifact(DataCheck::new("${ROTDIR}/gdas.${PDY}/log${dep}.txt"));
        let g = graph(vec![GraphEntry::Task(node("gdaspost", Some(dep.clone())))]);
        assert!(matches!(validate_graph(&g), Err(CycledagError::ConfigError(_))));

        let post = MetataskNode {
            name: "gdaspost".into(),
            var: "grp".into(),
            values: vec!["001".into()],
            side_tables: [("dep".to_string(), vec!["f009".to_string()])].into(),
            task: node("gdaspost${grp}", Some(dep)),
        };
        validate_graph(&graph(vec![GraphEntry::Metatask(post)])).unwrap();
    }

    #[test]
    fn offset_suffix_placeholders_are_checked() {
        let check = |suffix: &str| {
            Dependency::artifact(
                DataCheck::new("${ROTDIR}/gdas.${PDY}/${HH}/model_data/atmos/restart/")
                    .suffix_at(suffix, -Duration::hours(3)),
            )
        };
        let ok = graph(vec![GraphEntry::Task(node(
            "gdasfcst",
            Some(check("${PDY}.${HH}0000.coupler.res")),
        ))]);
        validate_graph(&ok).unwrap();

        let bad = graph(vec![GraphEntry::Task(node(
            "gdasfcst",
            Some(check("${STEP}.coupler.res")),
        ))]);
        assert!(matches!(validate_graph(&bad), Err(CycledagError::ConfigError(_))));
    }
}
