// src/resources/mod.rs

//! Batch resources of each task.
//!
//! Keys are looked up in the task's own scope (base merged with its task
//! sections). For the `gfs` group a `<key>_gfs` override wins over the
//! generic key when present; only walltime, task count, tasks per node and
//! thread count keys take overrides.

use serde::Serialize;
use tracing::trace;

use crate::catalog::TaskKind;
use crate::config::{ConfigScope, ExperimentConfig, scheduler_kind};
use crate::errors::{CycledagError, Result};
use crate::types::{CycleGroup, SchedulerKind};

/// Extra scheduler flags passed to every slurm job.
const SLURM_NATIVE: &str = "--export=NONE";

/// Key prefixes a `_gfs` override applies to (`npe_` covers `npe_node_`).
const GROUP_OVERRIDES: [&str; 3] = ["wtime_", "npe_", "nth_"];

/// Resolved batch resources of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    pub account: String,
    pub walltime: String,
    pub cores: u32,
    pub ppn: u32,
    pub nodes: u32,
    pub threads: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native: Option<String>,
    pub queue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

/// Named attribute of a [`ResourceDescriptor`] a task node exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceSlot {
    Account,
    Walltime,
    Nodes,
    Cores,
    Ppn,
    Threads,
    Memory,
    Native,
    Queue,
    Partition,
}

impl ResourceSlot {
    pub const ALL: [ResourceSlot; 10] = [
        ResourceSlot::Account,
        ResourceSlot::Walltime,
        ResourceSlot::Nodes,
        ResourceSlot::Cores,
        ResourceSlot::Ppn,
        ResourceSlot::Threads,
        ResourceSlot::Memory,
        ResourceSlot::Native,
        ResourceSlot::Queue,
        ResourceSlot::Partition,
    ];
}

impl ResourceDescriptor {
    /// Whether `slot` carries a value.
    pub fn has(&self, slot: ResourceSlot) -> bool {
        match slot {
            ResourceSlot::Memory => self.memory.is_some(),
            ResourceSlot::Native => self.native.is_some(),
            ResourceSlot::Partition => self.partition.is_some(),
            _ => true,
        }
    }
}

/// Resolves [`ResourceDescriptor`]s against one experiment config.
pub struct ResourceResolver<'a> {
    config: &'a ExperimentConfig,
    scheduler: SchedulerKind,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(config: &'a ExperimentConfig) -> Result<Self> {
        Ok(Self {
            config,
            scheduler: scheduler_kind(config.base())?,
        })
    }

    pub fn scheduler(&self) -> SchedulerKind {
        self.scheduler
    }

    pub fn resolve(&self, task: TaskKind, group: CycleGroup) -> Result<ResourceDescriptor> {
        let scope = self.config.task_scope(&task.config_sections());
        let lookup = Lookup {
            scope: &scope,
            section: format!("[task.{}]", task.as_str()),
            task: task.as_str(),
            group,
        };

        let account = lookup.required_string("ACCOUNT")?;
        let walltime = lookup.required_string(&format!("wtime_{}", task.as_str()))?;
        let cores = lookup.positive(&format!("npe_{}", task.as_str()))?;
        let ppn = lookup.positive(&format!("npe_node_{}", task.as_str()))?;
        let threads = lookup
            .count(&format!("nth_{}", task.as_str()))?
            .unwrap_or(1);
        let memory = lookup.string(&format!("memory_{}", task.as_str()));

        let service = task.is_service();
        let (queue, partition) = if self.scheduler.uses_partitions() {
            let partition = if service {
                lookup.required_string("QUEUE_SERVICE")?
            } else {
                lookup.required_string("PARTITION_BATCH")?
            };
            (lookup.required_string("QUEUE")?, Some(partition))
        } else if service {
            (lookup.required_string("QUEUE_SERVICE")?, None)
        } else {
            (lookup.required_string("QUEUE")?, None)
        };
        let native = (self.scheduler == SchedulerKind::Slurm).then(|| SLURM_NATIVE.to_string());

        let descriptor = ResourceDescriptor {
            account,
            walltime,
            cores,
            ppn,
            nodes: cores.div_ceil(ppn),
            threads,
            memory,
            native,
            queue,
            partition,
        };
        trace!(task = task.as_str(), %group, ?descriptor, "resolved resources");
        Ok(descriptor)
    }
}

/// Key lookup with the per-group override rule.
struct Lookup<'s> {
    scope: &'s ConfigScope,
    section: String,
    task: &'s str,
    group: CycleGroup,
}

impl Lookup<'_> {
    /// `<key>_gfs` for the `gfs` group when present, else `key`.
    fn key(&self, key: &str) -> String {
        let overridable = GROUP_OVERRIDES.iter().any(|p| key.starts_with(p));
        if overridable && self.group == CycleGroup::Gfs {
            let override_key = format!("{key}_gfs");
            if self.scope.contains(&override_key) {
                return override_key;
            }
        }
        key.to_string()
    }

    fn string(&self, key: &str) -> Option<String> {
        self.scope.string(&self.key(key))
    }

    fn required_string(&self, key: &str) -> Result<String> {
        let key = self.key(key);
        self.scope
            .string(&key)
            .ok_or_else(|| CycledagError::missing(self.section.as_str(), key))
    }

    fn count(&self, key: &str) -> Result<Option<u32>> {
        self.scope.count(&self.key(key))
    }

    fn positive(&self, key: &str) -> Result<u32> {
        let key = self.key(key);
        match self.scope.count(&key)? {
            None => Err(CycledagError::missing(self.section.as_str(), key)),
            Some(0) => Err(CycledagError::invalid(
                key,
                "0",
                format!("a positive count for task '{}'", self.task),
            )),
            Some(n) => Ok(n),
        }
    }
}
