// src/catalog/common.rs

//! Task descriptions shared by several modes.

use chrono::Duration;

use crate::calendar::fhmax_gfs_longest;
use crate::catalog::fanout::{self, FanOut};
use crate::catalog::{CatalogContext, EnvBinding, TaskKind, TaskSpec};
use crate::depend::{DataCheck, Dependency, Deps, rotdir_file, rotdir_path};
use crate::errors::{CycledagError, Result};
use crate::types::CycleGroup;

/// Offset of the previous 6-hourly primary cycle.
pub fn previous_cycle() -> Duration {
    -Duration::hours(6)
}

/// Minimum age of restart files before they count as complete.
pub fn settle_age() -> Duration {
    Duration::seconds(30)
}

/// Gate archiving on `ARCHIVE_TO_HPSS == YES`.
pub fn archive_gate() -> Dependency {
    Dependency::string_eq("${ARCHIVE_TO_HPSS}", "YES")
}

/// `${ROTDIR}/<run>.${PDY}/${HH}/atmos/RESTART/` with the coupler file of
/// the current cycle as suffix, evaluated one cycle back.
pub fn restart_coupler(run: &str, age: Duration) -> DataCheck {
    DataCheck::new(rotdir_path(run, "RESTART/"))
        .offset(previous_cycle())
        .suffix("${PDY}.${HH}0000.coupler.res")
        .min_age(age)
}

/// Observation dump status file under `DMPDIR`.
pub fn dump_status(ctx: &CatalogContext<'_>) -> DataCheck {
    let run = ctx.group.label();
    let suffix = ctx.base().string_or("DUMP_SUFFIX", "");
    DataCheck::new(format!(
        "${{DMPDIR}}/{run}{suffix}.${{PDY}}/${{HH}}/atmos/{run}.t${{HH}}z.updated.status.tm00.bufr_d"
    ))
}

/// Fetch restart or analysis inputs unless the previous forecast already
/// produced them.
pub fn getic(ctx: &CatalogContext<'_>) -> TaskSpec {
    let previous_forecast = Dependency::any_of(vec![
        Dependency::peer_at(ctx.name_in(CycleGroup::Gdas, TaskKind::Fcst), previous_cycle()),
        Dependency::artifact(restart_coupler("gdas", settle_age())),
    ]);
    let analysis_missing = Dependency::none_of(vec![Dependency::artifact(
        DataCheck::new(rotdir_file(&ctx.flags.icdump, "atmanl.nc")).min_age(settle_age()),
    )]);
    let dep = Dependency::any_of(vec![
        Dependency::all_of(vec![previous_forecast, analysis_missing]),
        Dependency::cycle_exists(previous_cycle(), true),
    ]);
    ctx.spec(TaskKind::Getic).depends_on(Some(dep))
}

/// Post-processing fanned out over forecast-hour groups.
///
/// Each group waits for the forecast log of its last hour; with
/// `or_forecast` a finished forecast also releases it.
pub fn post(ctx: &CatalogContext<'_>, or_forecast: bool) -> Result<TaskSpec> {
    let base = ctx.base();
    let hours = match ctx.group {
        CycleGroup::Gdas => fanout::hour_range(
            base.int_or("FHMIN", 0)?,
            base.int_or("FHMAX", 9)?,
            base.int_or("FHOUT", 3)?,
        ),
        CycleGroup::Gfs => fanout::two_rate_hours(
            base.int_or("FHMIN_GFS", 0)?,
            base.int_or("FHMAX_HF_GFS", 0)?,
            base.int_or("FHOUT_HF_GFS", 1)?,
            fhmax_gfs_longest(base)?,
            base.int_or("FHOUT_GFS", 3)?,
        ),
    };
    if hours.is_empty() {
        return Err(CycledagError::InvalidFanOut {
            task: ctx.name(TaskKind::Post),
            reason: "forecast-hour range is empty".to_string(),
        });
    }

    let groups = ctx.scope(TaskKind::Post).int_or("NPOSTGRP", 1)?;
    let groups = fanout::hour_groups(&hours, usize::try_from(groups).unwrap_or(1));

    let run = ctx.group.label();
    let log = DataCheck::new(rotdir_file(run, "log${dep}.txt"));
    let dep = Deps::new()
        .data(log)
        .task_if(or_forecast, ctx.name(TaskKind::Fcst))
        .any();

    let fan_out = FanOut::new(ctx.name(TaskKind::Post), "grp", groups.labels)
        .with_table("dep", groups.anchors)
        .with_table("lst", groups.lists);

    Ok(ctx
        .spec(TaskKind::Post)
        .depends_on(dep)
        .with_env(EnvBinding::text("ROTDIR", "${ROTDIR}"))
        .with_env(EnvBinding::fan_out_var("FHRGRP", "grp"))
        .with_env(EnvBinding::fan_out_var("FHRLST", "lst"))
        .fanned_out(fan_out))
}

/// Verification after every post group finished.
pub fn vrfy(ctx: &CatalogContext<'_>) -> TaskSpec {
    ctx.spec(TaskKind::Vrfy)
        .depends_on(Some(Dependency::metatask(ctx.name(TaskKind::Post))))
}

/// METplus cases, each waiting for this cycle's post and the previous
/// cycle's archive.
pub fn metp(ctx: &CatalogContext<'_>) -> TaskSpec {
    let cases = ["g2g1", "g2o1", "pcp1"].map(String::from).to_vec();
    let dep = Deps::new()
        .metatask(ctx.name(TaskKind::Post))
        .task_at(ctx.name(TaskKind::Arch), -ctx.interval())
        .all();
    let sdate_gfs = ctx.base().string_or("SDATE_GFS", "");

    ctx.spec(TaskKind::Metp)
        .depends_on(dep)
        .with_env(EnvBinding::text("SDATE_GFS", sdate_gfs))
        .with_env(EnvBinding::fan_out_var("METPCASE", "metpcase"))
        .fanned_out(FanOut::new(ctx.name(TaskKind::Metp), "metpcase", cases))
}

/// Products derived from the forecast or from post output.
///
/// Returns `None` for tasks that are not downstream products.
pub fn product(ctx: &CatalogContext<'_>, task: TaskKind) -> Option<TaskSpec> {
    use TaskKind::*;
    let after_post = || {
        if ctx.has(Post) {
            Dependency::metatask(ctx.name(Post))
        } else {
            Dependency::peer(ctx.name(Fcst))
        }
    };
    let dep = match task {
        Wavepostsbs | Wavepostbndpnt | Wavepostbndpntbll | Postsnd | Ocnpost => {
            Deps::new().task(ctx.name(Fcst)).all()
        }
        Wavepostpnt => Deps::new()
            .task(ctx.name(Fcst))
            .task_if(ctx.has(Wavepostbndpntbll), ctx.name(Wavepostbndpntbll))
            .all(),
        Wavegempak | Waveawipsgridded => Deps::new().task(ctx.name(Wavepostsbs)).all(),
        Waveawipsbulls => Deps::new()
            .task(ctx.name(Wavepostsbs))
            .task(ctx.name(Wavepostpnt))
            .all(),
        Gempak | Awips | Wafs | Wafsgcip | Wafsgrib2 | Wafsgrib20p25 => Some(after_post()),
        Wafsblending => Deps::new().task(ctx.name(Wafsgrib2)).all(),
        Wafsblending0p25 => Deps::new().task(ctx.name(Wafsgrib20p25)).all(),
        _ => return None,
    };
    Some(ctx.spec(task).depends_on(dep))
}

/// Ensemble member-group fan-out under metatask `<group><suffix>`.
pub fn member_fan_out(
    ctx: &CatalogContext<'_>,
    suffix: &str,
    per_group_key: &str,
    first: u32,
) -> Result<FanOut> {
    let base = ctx.base();
    let members = base.count("NMEM_ENKF")?.unwrap_or(80);
    let per_group = base.count(per_group_key)?.unwrap_or(10);
    if per_group == 0 {
        return Err(CycledagError::invalid(per_group_key, "0", "a positive group size"));
    }
    Ok(FanOut::new(
        ctx.metatask_name(suffix),
        "grp",
        fanout::member_groups(members, per_group, first),
    ))
}

/// Fetch ensemble member forecasts that are not already on disk.
pub fn eget(ctx: &CatalogContext<'_>) -> Result<TaskSpec> {
    let missing = |file: &str| {
        DataCheck::new(format!(
            "${{ROTDIR}}/enkfgdas.${{PDY}}/${{HH}}/atmos/mem001/gdas.t${{HH}}z.{file}"
        ))
    };
    let dep = Deps::new()
        .data(missing("atmf006.nc"))
        .data(missing("sfcf006.nc"))
        .none();
    let fan_out = member_fan_out(ctx, "egmn", "NMEM_EARCGRP", 1)?;
    Ok(ctx
        .spec(TaskKind::Eget)
        .depends_on(dep)
        .with_env(EnvBinding::fan_out_var("ENSGRP", "grp"))
        .fanned_out(fan_out))
}

/// Archive this cycle once post (and verification) are done, gated on
/// `ARCHIVE_TO_HPSS`; without post output, archive after the forecast.
pub fn arch_after_products(ctx: &CatalogContext<'_>) -> TaskSpec {
    let dep = if ctx.has(TaskKind::Post) {
        let upstream = if ctx.has(TaskKind::Vrfy) {
            Dependency::peer(ctx.name(TaskKind::Vrfy))
        } else {
            Dependency::metatask(ctx.name(TaskKind::Post))
        };
        Deps::new()
            .with(upstream)
            .with_if(ctx.has(TaskKind::Metp), || {
                Dependency::metatask(ctx.name(TaskKind::Metp))
            })
            .with(archive_gate())
            .all()
    } else {
        Deps::new().task(ctx.name(TaskKind::Fcst)).all()
    };
    ctx.spec(TaskKind::Arch).depends_on(dep)
}
