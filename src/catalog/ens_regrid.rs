// src/catalog/ens_regrid.rs

//! Ensemble regridding: fetch archived ensemble members, regrid them in
//! member groups, then post-process and archive the result.

use chrono::Duration;

use crate::calendar::Calendar;
use crate::catalog::common::{self, member_fan_out};
use crate::catalog::env::previous_cycle_bindings;
use crate::catalog::{
    CatalogContext, EnvBinding, FeatureFlags, ModePolicy, TaskKind, TaskPlan, TaskSpec,
};
use crate::depend::Dependency;
use crate::errors::{CycledagError, Result};
use crate::types::CycleGroup;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnsRegrid;

impl ModePolicy for EnsRegrid {
    fn plan(&self, _flags: &FeatureFlags, _calendar: &Calendar) -> TaskPlan {
        use TaskKind::*;
        TaskPlan::new().with_group(CycleGroup::Gdas, vec![Eget, Enspost, Ergpos, Archerg])
    }

    fn describe(&self, ctx: &CatalogContext<'_>, task: TaskKind) -> Result<TaskSpec> {
        use TaskKind::*;

        let spec = match task {
            Eget => common::eget(ctx)?,
            Enspost => ctx
                .spec(Enspost)
                .depends_on(Some(Dependency::metatask(ctx.metatask_name("egmn"))))
                .with_env(EnvBinding::fan_out_var("ENSGRP", "grp"))
                .fanned_out(member_fan_out(ctx, "ermn", "NMEM_EARCGRP", 1)?),
            Ergpos => ctx
                .spec(Ergpos)
                .depends_on(Some(Dependency::metatask(ctx.metatask_name("ermn")))),
            Archerg => ctx
                .spec(Archerg)
                .depends_on(Some(Dependency::peer(ctx.name(Ergpos)))),
            other => {
                return Err(CycledagError::ConfigError(format!(
                    "task '{other}' is not part of ens-regrid experiments"
                )));
            }
        };

        // Jobs look up the 6-hourly background cycle regardless of cadence.
        let mut spec = spec;
        spec.env.extend(previous_cycle_bindings(Duration::hours(6)));
        Ok(spec)
    }
}
