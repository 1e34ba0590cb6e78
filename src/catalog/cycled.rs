// src/catalog/cycled.rs

//! Cycled data assimilation: a 6-hourly `gdas` cycle with analysis and an
//! optional hybrid ensemble, plus the longer `gfs` forecasts.

use crate::calendar::Calendar;
use crate::catalog::common::{self, dump_status, member_fan_out, previous_cycle};
use crate::catalog::fanout::{self, FanOut};
use crate::catalog::{
    CatalogContext, EnvBinding, FeatureFlags, ModePolicy, TaskKind, TaskPlan, TaskSpec,
};
use crate::depend::{DataCheck, Dependency, Deps, rotdir_file};
use crate::errors::{CycledagError, Result};
use crate::types::CycleGroup;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cycled;

impl ModePolicy for Cycled {
    fn plan(&self, flags: &FeatureFlags, _calendar: &Calendar) -> TaskPlan {
        use TaskKind::*;

        let mut before_fcst = vec![Prep];
        if flags.ensreplay {
            before_fcst.push(Eget);
        }
        if flags.do_jedivar {
            before_fcst.extend([Atmanalprep, Atmanalrun, Atmanalpost]);
        } else {
            before_fcst.push(Anal);
        }
        before_fcst.extend([Sfcanl, Analcalc]);

        let mut after_fcst = vec![Post];
        if flags.do_vrfy {
            after_fcst.push(Vrfy);
        }

        let (hybrid_shared, hybrid_gdas) = if !flags.do_hybvar {
            (vec![], vec![])
        } else if flags.do_jediens {
            (
                vec![Atmensanalprep, Atmensanalrun, Atmensanalpost, Echgres],
                vec![Ecen, Esfc, Efcs, Epos, Earc],
            )
        } else {
            let observer = if flags.lobsdiag_forenkf { Ediag } else { Eomg };
            (
                vec![Eobs, Eupd, Echgres, observer],
                vec![Ecen, Esfc, Efcs, Epos, Earc],
            )
        };

        let wave_posts = |group: CycleGroup| {
            let mut t = Vec::new();
            if flags.waves_in(group) {
                if flags.do_wave_bnd {
                    t.extend([Wavepostbndpnt, Wavepostbndpntbll]);
                }
                t.extend([Wavepostsbs, Wavepostpnt]);
            }
            t
        };

        let mut gdas = Vec::new();
        if flags.do_tref {
            gdas.extend([Getic, Init]);
        }
        gdas.extend(before_fcst.iter().copied());
        if !flags.do_jedivar {
            gdas.push(Analdiag);
        }
        if flags.do_gldas {
            gdas.push(Gldas);
        }
        if flags.waves_in(CycleGroup::Gdas) {
            gdas.extend([Waveinit, Waveprep]);
        }
        gdas.push(Fcst);
        gdas.extend(after_fcst.iter().copied());
        if flags.ensemble_update_in(CycleGroup::Gdas) {
            gdas.extend(hybrid_shared.iter().copied());
            gdas.extend(hybrid_gdas);
        }
        gdas.extend(wave_posts(CycleGroup::Gdas));
        gdas.push(Arch);

        let mut gfs = Vec::new();
        if flags.gfsanl {
            gfs.extend(before_fcst);
        }
        if flags.waves_in(CycleGroup::Gfs) {
            gfs.extend([Waveinit, Waveprep]);
        }
        gfs.push(Fcst);
        gfs.extend(after_fcst);
        if flags.do_metp {
            gfs.push(Metp);
        }
        if flags.gfsanl && flags.ensemble_update_in(CycleGroup::Gfs) {
            gfs.extend(hybrid_shared);
        }
        gfs.extend(wave_posts(CycleGroup::Gfs));
        if flags.waves_in(CycleGroup::Gfs) {
            if flags.do_gempak {
                gfs.push(Wavegempak);
            }
            if flags.do_awips {
                gfs.extend([Waveawipsbulls, Waveawipsgridded]);
            }
        }
        if flags.do_bufrsnd {
            gfs.push(Postsnd);
        }
        if flags.do_gempak {
            gfs.push(Gempak);
        }
        if flags.do_awips {
            gfs.push(Awips);
        }
        if flags.do_wafs {
            gfs.extend([
                Wafs,
                Wafsgcip,
                Wafsgrib2,
                Wafsgrib20p25,
                Wafsblending,
                Wafsblending0p25,
            ]);
        }
        gfs.push(Arch);

        TaskPlan::new()
            .with_group(CycleGroup::Gdas, gdas)
            .with_group(CycleGroup::Gfs, gfs)
    }

    fn describe(&self, ctx: &CatalogContext<'_>, task: TaskKind) -> Result<TaskSpec> {
        use TaskKind::*;

        let prev = previous_cycle();
        let gdas = CycleGroup::Gdas;
        let spec = ctx.spec(task);

        let spec = match task {
            Getic => common::getic(ctx),
            Init => spec.depends_on(Some(Dependency::peer(ctx.name(Getic)))),
            Prep => {
                let dep = Deps::new()
                    .with(Dependency::metatask_at(ctx.name_in(gdas, Post), prev))
                    .data(DataCheck::new(rotdir_file("gdas", "atmf009.nc")).offset(prev))
                    .data(dump_status(ctx))
                    .task_if(ctx.has(Init), ctx.name(Init))
                    .all();
                spec.depends_on(dep)
            }
            Eget => common::eget(ctx)?,
            Anal | Atmanalprep => spec.depends_on(analysis_inputs(ctx)),
            Atmanalrun => spec.depends_on(Some(Dependency::peer(ctx.name(Atmanalprep)))),
            Atmanalpost => spec.depends_on(Some(Dependency::peer(ctx.name(Atmanalrun)))),
            Analdiag => spec.depends_on(Some(Dependency::peer(ctx.name(Anal)))),
            Sfcanl => {
                let upstream = if ctx.has(Anal) { Anal } else { Atmanalrun };
                spec.depends_on(Some(Dependency::peer(ctx.name(upstream))))
            }
            Analcalc => {
                let dep = Deps::new()
                    .task(ctx.name(Sfcanl))
                    .with_if(ctx.is_gdas() && ctx.has(Echgres), || {
                        Dependency::peer_at(ctx.name(Echgres), prev)
                    })
                    .all();
                spec.depends_on(dep)
            }
            Gldas => spec.depends_on(Some(Dependency::peer(ctx.name(Sfcanl)))),
            Waveinit => {
                let dep = Deps::new()
                    .with_opt(ctx.local_or_gdas(Prep).map(Dependency::peer))
                    .with_if(ctx.is_gdas(), || Dependency::cycle_exists(prev, true))
                    .any();
                spec.depends_on(dep)
            }
            Waveprep => spec.depends_on(Some(Dependency::peer(ctx.name(Waveinit)))),
            Fcst => {
                let core = Deps::new()
                    .with_opt(ctx.local_or_gdas(Sfcanl).map(Dependency::peer))
                    .task_if(ctx.has(Gldas), ctx.name(Gldas))
                    .task_if(ctx.has(Waveprep), ctx.name(Waveprep))
                    .all();
                let dep = if ctx.is_gdas() {
                    Deps::new().with_opt(core).cycle_missing(prev).any()
                } else {
                    core
                };
                spec.depends_on(dep)
            }
            Post => common::post(ctx, true)?,
            Vrfy => common::vrfy(ctx),
            Metp => common::metp(ctx),
            Eobs | Atmensanalprep => {
                let dep = Deps::new()
                    .task(ctx.name(Prep))
                    .with_if(ctx.has_in(gdas, Epos), || {
                        Dependency::metatask_at("gdasepmn", prev)
                    })
                    .all();
                spec.depends_on(dep)
            }
            Eomg | Ediag => spec.depends_on(Some(Dependency::peer(ctx.name(Eobs)))),
            Eupd => {
                let observer = if ctx.has(Ediag) { Ediag } else { Eomg };
                spec.depends_on(Some(Dependency::peer(ctx.name(observer))))
            }
            Atmensanalrun => spec.depends_on(Some(Dependency::peer(ctx.name(Atmensanalprep)))),
            Atmensanalpost => spec.depends_on(Some(Dependency::peer(ctx.name(Atmensanalrun)))),
            Echgres => {
                let dep = Deps::new()
                    .task(ctx.name(Fcst))
                    .with_if(ctx.has_in(gdas, Efcs), || Dependency::metatask("gdasefmn"))
                    .all();
                spec.depends_on(dep)
            }
            Ecen | Esfc => {
                let update = if ctx.has(Eupd) { Eupd } else { Atmensanalpost };
                let dep = Deps::new()
                    .task(ctx.name(Analcalc))
                    .task(ctx.name(update))
                    .all();
                spec.depends_on(dep)
            }
            Efcs => {
                let recentered = Deps::new().task(ctx.name(Ecen)).task(ctx.name(Esfc)).all();
                let dep = Deps::new()
                    .with_opt(recentered)
                    .cycle_missing(prev)
                    .any();
                spec.depends_on(dep)
                    .with_env(EnvBinding::fan_out_var("ENSGRP", "grp"))
                    .fanned_out(member_fan_out(ctx, "efmn", "NMEM_EFCSGRP", 1)?)
            }
            Epos => spec
                .depends_on(Some(Dependency::metatask(ctx.metatask_name("efmn"))))
                .with_env(EnvBinding::fan_out_var("FHRGRP", "grp"))
                .with_env(EnvBinding::fan_out_var("FHRLST", "lst"))
                .fanned_out(ensemble_hour_groups(ctx)?),
            Earc => spec
                .depends_on(Some(Dependency::metatask(ctx.metatask_name("epmn"))))
                .with_env(EnvBinding::fan_out_var("ENSGRP", "grp"))
                .fanned_out(member_fan_out(ctx, "eamn", "NMEM_EARCGRP", 0)?),
            Arch => common::arch_after_products(ctx),
            other => common::product(ctx, other).ok_or_else(|| {
                CycledagError::ConfigError(format!(
                    "task '{other}' is not part of cycled experiments"
                ))
            })?,
        };
        Ok(spec)
    }
}

/// Prep, fetched ensemble members and the previous ensemble forecast.
fn analysis_inputs(ctx: &CatalogContext<'_>) -> Option<Dependency> {
    Deps::new()
        .task(ctx.name(TaskKind::Prep))
        .with_if(ctx.has(TaskKind::Eget), || {
            Dependency::metatask(ctx.metatask_name("egmn"))
        })
        .with_if(ctx.flags.do_hybvar && ctx.has_in(CycleGroup::Gdas, TaskKind::Epos), || {
            Dependency::metatask_at("gdasepmn", previous_cycle())
        })
        .all()
}

/// Ensemble post groups over `FHMIN_ENKF..=FHMAX_ENKF`.
fn ensemble_hour_groups(ctx: &CatalogContext<'_>) -> Result<FanOut> {
    let scope = ctx.scope(TaskKind::Epos);
    let hours = fanout::hour_range(
        scope.int_or("FHMIN_ENKF", 3)?,
        scope.int_or("FHMAX_ENKF", 9)?,
        scope.int_or("FHOUT_ENKF", 3)?,
    );
    let groups = scope.int_or("NEPGRP", 3)?;
    let groups = fanout::hour_groups(&hours, usize::try_from(groups).unwrap_or(1));
    Ok(FanOut::new(ctx.metatask_name("epmn"), "grp", groups.labels)
        .with_table("lst", groups.lists))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::specs_for;

    fn find<'a>(specs: &'a [TaskSpec], name: &str) -> &'a TaskSpec {
        specs.iter().find(|s| s.name() == name).unwrap()
    }

    #[test]
    fn deterministic_and_gdas_first() {
        let entries = [("MODE", "cycled"), ("gfs_cyc", "1"), ("DOHYBVAR", "YES")];
        let a = specs_for(&entries);
        let b = specs_for(&entries);
        assert_eq!(a, b);
        assert_eq!(a[0].name(), "gdasprep");
        assert_eq!(a.last().unwrap().name(), "gfsarch");
    }

    #[test]
    fn gdas_forecast_can_start_without_a_previous_cycle() {
        let specs = specs_for(&[("MODE", "cycled"), ("gfs_cyc", "0")]);
        let fcst = find(&specs, "gdasfcst");
        assert_eq!(
            fcst.dependency.as_ref().unwrap().to_string(),
            "or(task gdassfcanl, no-cycle@-06:00:00)"
        );
        assert!(specs.iter().all(|s| s.group == CycleGroup::Gdas));
    }

    #[test]
    fn gfs_forecast_without_gfs_analysis_uses_gdas_surface() {
        let specs = specs_for(&[("MODE", "cycled"), ("gfs_cyc", "4")]);
        let fcst = find(&specs, "gfsfcst");
        assert_eq!(fcst.dependency, Some(Dependency::peer("gdassfcanl")));
    }

    #[test]
    fn hybrid_ensemble_tasks_and_fan_outs() {
        let specs = specs_for(&[
            ("MODE", "cycled"),
            ("gfs_cyc", "0"),
            ("DOHYBVAR", "YES"),
            ("NMEM_ENKF", "20"),
            ("NMEM_EFCSGRP", "5"),
        ]);
        let efcs = find(&specs, "gdasefcs");
        let fan_out = efcs.fan_out.as_ref().unwrap();
        assert_eq!(fan_out.metatask, "gdasefmn");
        assert_eq!(fan_out.values, vec!["01", "02", "03", "04"]);

        let earc = find(&specs, "gdasearc");
        assert_eq!(earc.fan_out.as_ref().unwrap().values[0], "00");

        let anal = find(&specs, "gdasanal");
        assert_eq!(
            anal.dependency.as_ref().unwrap().to_string(),
            "and(task gdasprep, metatask gdasepmn@-06:00:00)"
        );
        let analcalc = find(&specs, "gdasanalcalc");
        assert_eq!(
            analcalc.dependency.as_ref().unwrap().to_string(),
            "and(task gdassfcanl, task gdasechgres@-06:00:00)"
        );
    }
}
