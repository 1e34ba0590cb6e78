// src/catalog/omf.rs

//! Observation-minus-forecast reruns over an existing `gdas` archive.

use crate::calendar::Calendar;
use crate::catalog::common::previous_cycle;
use crate::catalog::{CatalogContext, FeatureFlags, ModePolicy, TaskKind, TaskPlan, TaskSpec};
use crate::depend::{DataCheck, Dependency, Deps, rotdir_file};
use crate::errors::{CycledagError, Result};
use crate::types::CycleGroup;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Omf;

impl ModePolicy for Omf {
    fn plan(&self, flags: &FeatureFlags, _calendar: &Calendar) -> TaskPlan {
        use TaskKind::*;

        let mut tasks = Vec::new();
        if flags.do_hpssarch {
            tasks.push(Getfcst);
        }
        tasks.extend([Prep, Gomg, Analdiag, Archomg]);
        TaskPlan::new().with_group(CycleGroup::Gdas, tasks)
    }

    fn describe(&self, ctx: &CatalogContext<'_>, task: TaskKind) -> Result<TaskSpec> {
        use TaskKind::*;

        let spec = ctx.spec(task);
        let upstream = |t: TaskKind| Some(Dependency::peer(ctx.name(t)));

        let spec = match task {
            Getfcst => spec.depends_on(background_files().none()),
            Prep if ctx.has(Getfcst) => spec.depends_on(upstream(Getfcst)),
            Prep => spec.depends_on(background_files().all()),
            Gomg => spec.depends_on(upstream(Prep)),
            Analdiag => spec.depends_on(upstream(Gomg)),
            Archomg => spec.depends_on(upstream(Analdiag)),
            other => {
                return Err(CycledagError::ConfigError(format!(
                    "task '{other}' is not part of omf experiments"
                )));
            }
        };
        Ok(spec)
    }
}

/// The previous cycle's 6-hour background forecast.
fn background_files() -> Deps {
    ["atmf006.nc", "sfcf006.nc"]
        .into_iter()
        .fold(Deps::new(), |deps, file| {
            deps.data(DataCheck::new(rotdir_file("gdas", file)).offset(previous_cycle()))
        })
}
