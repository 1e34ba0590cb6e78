// src/catalog/forecast_only.rs

//! Free forecasts from prepared initial conditions, with an optional
//! observation-minus-forecast pass on the `gomg` cadence.

use crate::calendar::Calendar;
use crate::catalog::common::{self, archive_gate, previous_cycle, settle_age};
use crate::catalog::{CatalogContext, FeatureFlags, ModePolicy, TaskKind, TaskPlan, TaskSpec};
use crate::depend::{DataCheck, Dependency, Deps, PathTemplate, rotdir_file, rotdir_path};
use crate::errors::{CycledagError, Result};
use crate::types::CadenceId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForecastOnly;

impl ModePolicy for ForecastOnly {
    fn plan(&self, flags: &FeatureFlags, calendar: &Calendar) -> TaskPlan {
        use TaskKind::*;

        let analinc = flags.do_analinc && flags.do_omf;
        let post = flags.do_atm && flags.do_post;
        let mut tasks = Vec::new();

        if flags.coupled {
            tasks.push(CoupledIc);
        } else {
            if flags.do_hpssarch {
                tasks.push(Getic);
            }
            if analinc {
                tasks.push(Getic4omg);
            }
            if !flags.warm_start {
                tasks.push(Init);
            }
        }
        if flags.do_aero {
            tasks.push(AerosolInit);
        }
        if flags.do_wave {
            tasks.push(Waveinit);
        }
        tasks.push(Fcst);

        if flags.do_omf {
            tasks.push(Prep);
            if analinc {
                tasks.push(Analinc);
            }
            tasks.extend([Gomg, Analdiag]);
        }
        if post {
            tasks.push(Post);
        }
        if flags.coupled {
            tasks.push(Ocnpost);
        }
        if post && flags.do_metp {
            tasks.extend([Vrfy, Metp]);
        }
        if flags.do_wave {
            if flags.do_wave_bnd {
                tasks.extend([Wavepostbndpnt, Wavepostbndpntbll]);
            }
            tasks.extend([Wavepostsbs, Wavepostpnt]);
            if flags.do_gempak {
                tasks.push(Wavegempak);
            }
            if flags.do_awips {
                tasks.extend([Waveawipsbulls, Waveawipsgridded]);
            }
        }
        if flags.do_bufrsnd {
            tasks.push(Postsnd);
        }
        if flags.do_gempak {
            tasks.push(Gempak);
        }
        if flags.do_awips {
            tasks.push(Awips);
        }
        if flags.do_wafs {
            tasks.extend([
                Wafs,
                Wafsgcip,
                Wafsgrib2,
                Wafsgrib20p25,
                Wafsblending,
                Wafsblending0p25,
            ]);
        }
        tasks.push(Arch);
        if flags.do_omf {
            tasks.push(Archomg);
        }

        TaskPlan::new().with_group(calendar.primary_group(), tasks)
    }

    fn describe(&self, ctx: &CatalogContext<'_>, task: TaskKind) -> Result<TaskSpec> {
        use TaskKind::*;

        let prev = previous_cycle();
        let run = ctx.group.label();
        let spec = ctx.spec(task);
        let previous_forecast = || Dependency::peer_at(ctx.name(Fcst), prev);

        let spec = match task {
            CoupledIc => spec,
            Getic => spec.depends_on(
                Deps::new()
                    .data(DataCheck::new(sfc_data(run)))
                    .data(DataCheck::new(sfcanl_data(run)))
                    .none(),
            ),
            Getic4omg => spec
                .depends_on(Some(previous_forecast()))
                .on_cadence(CadenceId::Gomg),
            Init => {
                let staged = Deps::new()
                    .with_opt(initial_conditions(&ctx.flags.icdump))
                    .task_if(ctx.has(Getic), ctx.name(Getic))
                    .all();
                spec.depends_on(staged)
            }
            AerosolInit | Waveinit => {
                let upstream = if ctx.has(CoupledIc) { CoupledIc } else { Init };
                let dep = Deps::new()
                    .task_if(ctx.has(upstream), ctx.name(upstream))
                    .all();
                spec.depends_on(dep)
            }
            Fcst => {
                let inputs = if ctx.flags.warm_start && ctx.has(Getic) {
                    Some(Dependency::peer(ctx.name(Getic)))
                } else {
                    Deps::new()
                        .data(DataCheck::new(sfc_data(run)))
                        .data(DataCheck::new(sfcanl_data(run)))
                        .any()
                };
                let dep = Deps::new()
                    .task_if(ctx.has(CoupledIc), ctx.name(CoupledIc))
                    .with_opt(inputs)
                    .task_if(ctx.has(AerosolInit), ctx.name(AerosolInit))
                    .task_if(ctx.has(Waveinit), ctx.name(Waveinit))
                    .all();
                spec.depends_on(dep)
            }
            Prep => spec
                .depends_on(Some(previous_forecast()))
                .on_cadence(CadenceId::Gomg),
            Analinc => {
                let icdump = &ctx.flags.icdump;
                let dep = Deps::new()
                    .data(DataCheck::new(format!(
                        "${{ICSDIR}}/{icdump}.${{PDY}}/${{HH}}/atmos/{icdump}.t${{HH}}z.atmanl.nc"
                    )))
                    .data(
                        DataCheck::new(rotdir_file(run, "logf009.txt"))
                            .offset(prev)
                            .min_age(settle_age()),
                    )
                    .with(previous_forecast())
                    .all();
                spec.depends_on(dep).on_cadence(CadenceId::Gomg)
            }
            Gomg => spec
                .depends_on(Some(Dependency::peer(ctx.name(Prep))))
                .on_cadence(CadenceId::Gomg),
            Analdiag => spec
                .depends_on(Some(Dependency::peer(ctx.name(Gomg))))
                .on_cadence(CadenceId::Gomg),
            Archomg => spec
                .depends_on(Some(Dependency::peer(ctx.name(Analdiag))))
                .on_cadence(CadenceId::Gomg),
            Post => common::post(ctx, false)?,
            Vrfy => common::vrfy(ctx),
            Metp => common::metp(ctx),
            Arch => {
                let dep = if ctx.has(Post) {
                    Deps::new()
                        .metatask(ctx.name(Post))
                        .task_if(ctx.has(Vrfy), ctx.name(Vrfy))
                        .with(archive_gate())
                        .all()
                } else {
                    Deps::new().task(ctx.name(Fcst)).all()
                };
                spec.depends_on(dep)
            }
            other => common::product(ctx, other).ok_or_else(|| {
                CycledagError::ConfigError(format!(
                    "task '{other}' is not part of forecast-only experiments"
                ))
            })?,
        };
        Ok(spec)
    }
}

fn sfc_data(run: &str) -> PathTemplate {
    rotdir_path(run, "INPUT/sfc_data.tile6.nc")
}

fn sfcanl_data(run: &str) -> PathTemplate {
    rotdir_path(run, "RESTART/${PDY}.${HH}0000.sfcanl_data.tile6.nc")
}

/// Any of the initial-condition layouts under `ICSDIR`.
fn initial_conditions(icdump: &str) -> Option<Dependency> {
    let dir = format!("${{ICSDIR}}/{icdump}.${{PDY}}/${{HH}}");
    Deps::new()
        .data(DataCheck::new(format!("{dir}/{icdump}.t${{HH}}z.sanl")))
        .data(DataCheck::new(format!("{dir}/{icdump}.t${{HH}}z.atmanl.nemsio")))
        .data(DataCheck::new(format!("{dir}/{icdump}.t${{HH}}z.atmanl.nc")))
        .data(DataCheck::new(format!("{dir}/atmos/{icdump}.t${{HH}}z.atmanl.nc")))
        .data(DataCheck::new(format!(
            "{dir}/atmos/RESTART/${{PDY}}.${{HH}}0000.sfcanl_data.tile6.nc"
        )))
        .any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::specs_for;
    use crate::types::CycleGroup;

    fn names(specs: &[TaskSpec]) -> Vec<String> {
        specs.iter().map(TaskSpec::name).collect()
    }

    #[test]
    fn cold_start_atmosphere_only() {
        let specs = specs_for(&[("MODE", "forecast-only"), ("gfs_cyc", "1")]);
        assert_eq!(
            names(&specs),
            vec!["gfsinit", "gfsfcst", "gfspost", "gfsarch"]
        );
        assert!(specs.iter().all(|s| s.group == CycleGroup::Gfs));

        let fcst = &specs[1];
        assert_eq!(
            fcst.dependency.as_ref().unwrap().to_string(),
            "or(data ${ROTDIR}/gfs.${PDY}/${HH}/atmos/INPUT/sfc_data.tile6.nc, \
             data ${ROTDIR}/gfs.${PDY}/${HH}/atmos/RESTART/${PDY}.${HH}0000.sfcanl_data.tile6.nc)"
        );

        let init = &specs[0];
        assert_eq!(init.dependency.as_ref().unwrap().children().len(), 5);
    }

    #[test]
    fn post_waits_only_for_forecast_logs() {
        let specs = specs_for(&[("MODE", "forecast-only")]);
        let post = specs.iter().find(|s| s.task == TaskKind::Post).unwrap();
        assert_eq!(
            post.dependency.as_ref().unwrap().to_string(),
            "data ${ROTDIR}/gfs.${PDY}/${HH}/atmos/gfs.t${HH}z.log${dep}.txt"
        );
    }

    #[test]
    fn warm_start_with_archive_fetch_skips_init() {
        let specs = specs_for(&[
            ("MODE", "forecast-only"),
            ("EXP_WARM_START", ".true."),
            ("HPSSARCH", "YES"),
            ("DO_POST", "NO"),
        ]);
        assert_eq!(names(&specs), vec!["gfsgetic", "gfsfcst", "gfsarch"]);
        assert_eq!(specs[1].dependency, Some(Dependency::peer("gfsgetic")));
        assert_eq!(specs[2].dependency, Some(Dependency::peer("gfsfcst")));
    }

    #[test]
    fn omf_tasks_run_on_the_gomg_cadence() {
        let specs = specs_for(&[("MODE", "forecast-only"), ("DO_OmF", "YES")]);
        let gomg: Vec<_> = specs
            .iter()
            .filter(|s| s.cadence == CadenceId::Gomg)
            .map(TaskSpec::name)
            .collect();
        assert_eq!(
            gomg,
            vec!["gdasprep", "gdasgomg", "gdasanaldiag", "gdasarchomg"]
        );
        assert_eq!(specs.last().unwrap().name(), "gdasarchomg");
    }

    #[test]
    fn arch_waits_for_post_and_verification() {
        let specs = specs_for(&[("MODE", "forecast-only"), ("DO_METP", "YES")]);
        let arch = specs.iter().find(|s| s.task == TaskKind::Arch).unwrap();
        assert_eq!(
            arch.dependency.as_ref().unwrap().to_string(),
            "and(metatask gfspost, task gfsvrfy, streq(${ARCHIVE_TO_HPSS}, YES))"
        );
    }
}
