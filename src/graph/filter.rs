// src/graph/filter.rs

use crate::graph::WorkflowGraph;

/// Drop every resource slot whose value is absent for its task, e.g. a
/// memory request only one cycle group configures.
pub fn strip_absent_slots(graph: &mut WorkflowGraph) {
    for entry in graph.entries_mut() {
        let node = entry.task_mut();
        let resources = &node.resources;
        node.slots.retain(|slot| resources.has(*slot));
    }
}
