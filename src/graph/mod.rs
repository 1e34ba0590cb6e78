// src/graph/mod.rs

//! The compiled workflow graph.
//!
//! - [`assembler`] merges catalog descriptions with resolved resources.
//! - [`filter`] strips resource slots a task has no value for.
//! - [`validate`] checks references, placeholders and same-cycle ordering.
//!
//! The graph is an abstract structure. Rendering it into the text format of
//! a particular workflow engine is left to the consumer.

pub mod assembler;
pub mod filter;
pub mod validate;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::calendar::Cadence;
use crate::catalog::{EnvBinding, TaskKind};
use crate::depend::Dependency;
use crate::resources::{ResourceDescriptor, ResourceSlot};
use crate::types::{CadenceId, CycleGroup, Mode};

pub use assembler::assemble;
pub use validate::validate_graph;

/// Where and when a graph was produced. Never used for control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub generated_at: DateTime<Utc>,
    pub pslot: String,
}

/// Engine-wide limits copied from `[base]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkflowSettings {
    pub cycle_throttle: u32,
    pub task_throttle: u32,
    pub max_tries: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            cycle_throttle: 6,
            task_throttle: 25,
            max_tries: 2,
        }
    }
}

/// One concrete job template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    pub name: String,
    pub task: TaskKind,
    pub group: CycleGroup,
    pub cadence: CadenceId,
    pub command: String,
    pub job_name: String,
    pub log: String,
    pub max_tries: u32,
    pub env: Vec<EnvBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Dependency>,
    pub resources: ResourceDescriptor,
    pub slots: Vec<ResourceSlot>,
}

/// A task replicated over `values` of `var`.
///
/// The member task's name and templates reference `${var}` and the side
/// table names; the engine expands one member per value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetataskNode {
    pub name: String,
    pub var: String,
    pub values: Vec<String>,
    pub side_tables: BTreeMap<String, Vec<String>>,
    pub task: TaskNode,
}

impl MetataskNode {
    /// Variables the member task may reference.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.var.as_str()).chain(self.side_tables.keys().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GraphEntry {
    Task(TaskNode),
    Metatask(MetataskNode),
}

impl GraphEntry {
    /// Name other entries reference this one by.
    pub fn name(&self) -> &str {
        match self {
            GraphEntry::Task(t) => &t.name,
            GraphEntry::Metatask(m) => &m.name,
        }
    }

    /// The task node itself, or the member template of a metatask.
    pub fn task(&self) -> &TaskNode {
        match self {
            GraphEntry::Task(t) => t,
            GraphEntry::Metatask(m) => &m.task,
        }
    }

    pub fn task_mut(&mut self) -> &mut TaskNode {
        match self {
            GraphEntry::Task(t) => t,
            GraphEntry::Metatask(m) => &mut m.task,
        }
    }

    pub fn is_metatask(&self) -> bool {
        matches!(self, GraphEntry::Metatask(_))
    }
}

/// Ordered entries of one cycle group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskGroup {
    pub group: CycleGroup,
    pub entries: Vec<GraphEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowGraph {
    pub mode: Mode,
    pub provenance: Provenance,
    /// Experiment-wide placeholder values (`PSLOT`, roots, `ARCHIVE_TO_HPSS`).
    pub bindings: BTreeMap<String, String>,
    pub settings: WorkflowSettings,
    /// Valid cadences only.
    pub cadences: Vec<Cadence>,
    pub groups: Vec<TaskGroup>,
}

impl WorkflowGraph {
    /// Every entry in emission order.
    pub fn entries(&self) -> impl Iterator<Item = &GraphEntry> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut GraphEntry> {
        self.groups.iter_mut().flat_map(|g| g.entries.iter_mut())
    }

    pub fn entry(&self, name: &str) -> Option<&GraphEntry> {
        self.entries().find(|e| e.name() == name)
    }

    /// Entry names in emission order.
    pub fn names(&self) -> Vec<&str> {
        self.entries().map(GraphEntry::name).collect()
    }

    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    pub fn cadence(&self, id: CadenceId) -> Option<&Cadence> {
        self.cadences.iter().find(|c| c.id == id)
    }
}
