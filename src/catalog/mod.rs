// src/catalog/mod.rs

//! Task catalog: which tasks each experiment mode contains, in which
//! order, and how they depend on each other.
//!
//! Every mode is a [`ModePolicy`]. A policy first produces a [`TaskPlan`]
//! (ordered tasks per cycle group) from the feature flags, then describes
//! each planned task. Descriptions can see the whole plan, so a dependency
//! on an optional task is only emitted when that task is present.

pub mod common;
pub mod cycled;
pub mod ens_regrid;
pub mod env;
pub mod fanout;
pub mod flags;
pub mod forecast_only;
pub mod omf;
pub mod replay;
pub mod task;

use chrono::Duration;
use tracing::{debug, warn};

use crate::calendar::Calendar;
use crate::config::{ConfigScope, ExperimentConfig};
use crate::depend::Dependency;
use crate::errors::{CycledagError, Result};
use crate::types::{CadenceId, CycleGroup, Mode};

pub use env::{CycleFormat, EnvBinding, EnvValue};
pub use fanout::FanOut;
pub use flags::FeatureFlags;
pub use task::TaskKind;

/// Fully described task, ready for resource resolution and assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub group: CycleGroup,
    pub task: TaskKind,
    pub cadence: CadenceId,
    pub dependency: Option<Dependency>,
    pub env: Vec<EnvBinding>,
    pub fan_out: Option<FanOut>,
}

impl TaskSpec {
    /// Emitted task name: group prefix plus task name.
    pub fn name(&self) -> String {
        task_name(self.group, self.task)
    }

    pub fn depends_on(mut self, dep: Option<Dependency>) -> Self {
        self.dependency = dep;
        self
    }

    pub fn on_cadence(mut self, cadence: CadenceId) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_env(mut self, binding: EnvBinding) -> Self {
        self.env.push(binding);
        self
    }

    pub fn fanned_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = Some(fan_out);
        self
    }
}

pub fn task_name(group: CycleGroup, task: TaskKind) -> String {
    format!("{}{}", group.label(), task.as_str())
}

/// Ordered tasks of one cycle group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub group: CycleGroup,
    pub tasks: Vec<TaskKind>,
}

/// Ordered groups with their ordered tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPlan {
    groups: Vec<GroupPlan>,
}

impl TaskPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: CycleGroup, tasks: Vec<TaskKind>) -> Self {
        self.groups.push(GroupPlan { group, tasks });
        self
    }

    pub fn groups(&self) -> &[GroupPlan] {
        &self.groups
    }

    pub fn contains(&self, group: CycleGroup, task: TaskKind) -> bool {
        self.groups
            .iter()
            .any(|g| g.group == group && g.tasks.contains(&task))
    }

    pub fn task_count(&self) -> usize {
        self.groups.iter().map(|g| g.tasks.len()).sum()
    }

    fn retain_groups(&mut self, keep: impl Fn(CycleGroup) -> bool) {
        self.groups.retain(|g| keep(g.group));
    }
}

/// What a mode policy can see while describing one task.
pub struct CatalogContext<'a> {
    pub calendar: &'a Calendar,
    pub flags: &'a FeatureFlags,
    pub plan: &'a TaskPlan,
    pub group: CycleGroup,
}

impl CatalogContext<'_> {
    pub fn config(&self) -> &ExperimentConfig {
        self.calendar.config()
    }

    pub fn base(&self) -> &ConfigScope {
        self.calendar.config().base()
    }

    pub fn is_gdas(&self) -> bool {
        self.group == CycleGroup::Gdas
    }

    pub fn name(&self, task: TaskKind) -> String {
        task_name(self.group, task)
    }

    pub fn name_in(&self, group: CycleGroup, task: TaskKind) -> String {
        task_name(group, task)
    }

    pub fn has(&self, task: TaskKind) -> bool {
        self.plan.contains(self.group, task)
    }

    pub fn has_in(&self, group: CycleGroup, task: TaskKind) -> bool {
        self.plan.contains(group, task)
    }

    /// `task` in this group, else in the primary `gdas` group.
    pub fn local_or_gdas(&self, task: TaskKind) -> Option<String> {
        if self.has(task) {
            Some(self.name(task))
        } else if self.has_in(CycleGroup::Gdas, task) {
            Some(self.name_in(CycleGroup::Gdas, task))
        } else {
            None
        }
    }

    /// Metatask name for a fan-out owned by this group (`gdas` + `efmn`).
    pub fn metatask_name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.group.label())
    }

    /// Effective config scope of a task.
    pub fn scope(&self, task: TaskKind) -> ConfigScope {
        self.config().task_scope(&task.config_sections())
    }

    /// Interval of this group's cadence.
    pub fn interval(&self) -> Duration {
        self.calendar
            .interval(self.group.default_cadence())
            .unwrap_or_else(|| Duration::hours(6))
    }

    /// Spec with the group's cadence and the per-cycle environment.
    pub fn spec(&self, task: TaskKind) -> TaskSpec {
        let run_envir = self.base().string_or("RUN_ENVIR", "emc");
        TaskSpec {
            group: self.group,
            task,
            cadence: self.group.default_cadence(),
            dependency: None,
            env: env::cycle_bindings(&run_envir, self.group),
            fan_out: None,
        }
    }
}

/// Task list and dependency rules of one experiment mode.
pub trait ModePolicy {
    /// Ordered tasks per cycle group.
    fn plan(&self, flags: &FeatureFlags, calendar: &Calendar) -> TaskPlan;

    /// Describe one planned task.
    fn describe(&self, ctx: &CatalogContext<'_>, task: TaskKind) -> Result<TaskSpec>;
}

/// Closed set of mode policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCatalog {
    Cycled(cycled::Cycled),
    ForecastOnly(forecast_only::ForecastOnly),
    Replay(replay::Replay),
    Omf(omf::Omf),
    EnsRegrid(ens_regrid::EnsRegrid),
}

impl ModeCatalog {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Cycled => ModeCatalog::Cycled(cycled::Cycled),
            Mode::ForecastOnly => ModeCatalog::ForecastOnly(forecast_only::ForecastOnly),
            Mode::Replay => ModeCatalog::Replay(replay::Replay),
            Mode::Omf => ModeCatalog::Omf(omf::Omf),
            Mode::EnsRegrid => ModeCatalog::EnsRegrid(ens_regrid::EnsRegrid),
        }
    }

    pub fn policy(&self) -> &dyn ModePolicy {
        match self {
            ModeCatalog::Cycled(p) => p,
            ModeCatalog::ForecastOnly(p) => p,
            ModeCatalog::Replay(p) => p,
            ModeCatalog::Omf(p) => p,
            ModeCatalog::EnsRegrid(p) => p,
        }
    }
}

/// Catalog bound to one experiment's calendar.
pub struct TaskCatalog<'a> {
    calendar: &'a Calendar,
    flags: FeatureFlags,
    modes: ModeCatalog,
}

impl<'a> TaskCatalog<'a> {
    pub fn new(calendar: &'a Calendar) -> Result<Self> {
        let config = calendar.config();
        Ok(Self {
            calendar,
            flags: FeatureFlags::from_scope(config.base())?,
            modes: ModeCatalog::for_mode(config.mode()),
        })
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    /// Planned tasks, keeping only groups whose cadence is valid.
    pub fn plan(&self) -> TaskPlan {
        let mut plan = self.modes.policy().plan(&self.flags, self.calendar);
        plan.retain_groups(|group| {
            let valid = self.calendar.is_valid(group.default_cadence());
            if !valid {
                warn!(%group, "cadence is disabled; dropping its tasks");
            }
            valid
        });
        plan
    }

    /// Describe every planned task in plan order.
    pub fn build(&self) -> Result<Vec<TaskSpec>> {
        let plan = self.plan();
        let policy = self.modes.policy();
        let mut specs = Vec::with_capacity(plan.task_count());

        for group_plan in plan.groups() {
            let ctx = CatalogContext {
                calendar: self.calendar,
                flags: &self.flags,
                plan: &plan,
                group: group_plan.group,
            };
            for &task in &group_plan.tasks {
                let spec = policy.describe(&ctx, task)?;
                if !self.calendar.is_valid(spec.cadence) {
                    return Err(CycledagError::ConfigError(format!(
                        "task '{}' is placed on cadence '{}', which is not active",
                        spec.name(),
                        spec.cadence
                    )));
                }
                if let Some(fan_out) = &spec.fan_out {
                    fan_out.check(&spec.name())?;
                }
                debug!(task = %spec.name(), cadence = %spec.cadence, "described task");
                specs.push(spec);
            }
        }
        Ok(specs)
    }
}
