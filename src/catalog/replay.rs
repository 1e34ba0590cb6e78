// src/catalog/replay.rs

//! Replay: each `gdas` cycle restarts from externally produced analyses or
//! increments instead of running its own analysis.
//!
//! `replay = 1` starts every cycle from fetched restarts; `replay = 2`
//! additionally applies a precomputed analysis increment.

use chrono::Duration;

use crate::calendar::Calendar;
use crate::catalog::common::{self, archive_gate, dump_status, previous_cycle, settle_age};
use crate::catalog::{CatalogContext, FeatureFlags, ModePolicy, TaskKind, TaskPlan, TaskSpec};
use crate::depend::{DataCheck, Dependency, Deps, rotdir_file, rotdir_path};
use crate::errors::{CycledagError, Result};
use crate::types::{CadenceId, CycleGroup};

/// Restart files younger than this are still being written by `gdasfcst`.
const SURFACE_RESTART_AGE_SECS: i64 = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Replay;

impl ModePolicy for Replay {
    fn plan(&self, flags: &FeatureFlags, _calendar: &Calendar) -> TaskPlan {
        use TaskKind::*;

        let mut gdas = vec![Getic, Init];
        if flags.do_omf {
            gdas.push(Prep);
        }
        if flags.replay == 2 {
            if flags.do_chgres_fcst {
                gdas.push(Echgres);
            }
            gdas.push(Analinc);
        }
        if flags.do_gcycle {
            gdas.push(Sfcanl);
            if flags.do_gldas {
                gdas.push(Gldas);
            }
        }
        gdas.push(Fcst);
        if (flags.do_gcycle && flags.do_gldas) || flags.gdaspost {
            gdas.push(Post);
        }
        if flags.do_omf {
            gdas.extend([Gomg, Analdiag, Archomg]);
        }
        gdas.push(Arch);

        let mut gfs = vec![Fcst];
        if flags.do_post {
            gfs.push(Post);
            if flags.do_vrfy {
                gfs.push(Vrfy);
            }
            if flags.do_metp {
                gfs.push(Metp);
            }
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
        let flags = ctx.flags;
        let spec = ctx.spec(task);
        let getic = || Dependency::peer(ctx.name_in(gdas, Getic));

        let spec = match task {
            Getic => common::getic(ctx),
            Init => {
                let spec = spec.depends_on(Some(getic()));
                if flags.replay == 2 && flags.rungcycle {
                    spec.on_cadence(CadenceId::First)
                } else {
                    spec
                }
            }
            Prep => {
                let dep = Deps::new()
                    .data(common::restart_coupler("gdas", settle_age()))
                    .data(dump_status(ctx))
                    .with(getic())
                    .all();
                spec.depends_on(dep)
            }
            Echgres => {
                let dep = Deps::new()
                    .with(getic())
                    .task_at(ctx.name(Fcst), prev)
                    .all();
                spec.depends_on(dep)
            }
            Analinc => {
                let dep = Deps::new()
                    .with(getic())
                    .task_if(ctx.has(Echgres), ctx.name(Echgres))
                    .data(
                        DataCheck::new(rotdir_file("gdas", "logf009.txt"))
                            .offset(prev)
                            .min_age(settle_age()),
                    )
                    .task_at(ctx.name(Fcst), prev)
                    .all();
                spec.depends_on(dep)
            }
            Sfcanl => {
                let upstream = if ctx.has(Prep) {
                    Dependency::peer(ctx.name(Prep))
                } else {
                    getic()
                };
                let dep = Deps::new()
                    .with(upstream)
                    .data(common::restart_coupler(
                        "gdas",
                        Duration::seconds(SURFACE_RESTART_AGE_SECS),
                    ))
                    .all();
                spec.depends_on(dep)
            }
            Gldas => {
                let surface = Deps::new()
                    .data(DataCheck::new(rotdir_file("gdas", "loginc.txt")))
                    .task(ctx.name(Sfcanl))
                    .any();
                let dep = Deps::new()
                    .with_opt(surface)
                    .with(Dependency::cycle_exists(prev, false))
                    .all();
                spec.depends_on(dep)
            }
            Fcst => spec.depends_on(forecast_inputs(ctx)),
            Gomg => {
                let grid = ctx.base().string_or("SUFFIX", "");
                let dep = Deps::new()
                    .task(ctx.name(Prep))
                    .data(
                        DataCheck::new(rotdir_file("gdas", &format!("sfcf006{grid}")))
                            .offset(prev)
                            .min_age(settle_age()),
                    )
                    .all();
                spec.depends_on(dep)
            }
            Analdiag => spec.depends_on(Some(Dependency::peer(ctx.name(Gomg)))),
            Archomg => spec.depends_on(Some(Dependency::peer(ctx.name(Analdiag)))),
            Post => common::post(ctx, true)?,
            Vrfy => common::vrfy(ctx),
            Metp => common::metp(ctx),
            Arch => {
                let dep = if ctx.has(Post) {
                    let upstream = if ctx.has(Vrfy) {
                        Dependency::peer(ctx.name(Vrfy))
                    } else {
                        Dependency::metatask(ctx.name(Post))
                    };
                    Deps::new().with(upstream).with(archive_gate()).all()
                } else {
                    Deps::new()
                        .task_if(ctx.has(Analdiag), ctx.name(Analdiag))
                        .task(ctx.name(Fcst))
                        .all()
                };
                spec.depends_on(dep)
            }
            other => {
                return Err(CycledagError::ConfigError(format!(
                    "task '{other}' is not part of replay experiments"
                )));
            }
        };
        Ok(spec)
    }
}

/// Surface state from this cycle's `gdas` preprocessing plus the restart or
/// increment the forecast starts from.
fn forecast_inputs(ctx: &CatalogContext<'_>) -> Option<Dependency> {
    use TaskKind::*;

    let gdas = CycleGroup::Gdas;
    let prev = previous_cycle();
    let surface = [Gldas, Sfcanl, Getic]
        .into_iter()
        .find(|&t| ctx.has_in(gdas, t))
        .map(|t| Dependency::peer(ctx.name_in(gdas, t)));
    let ready = Deps::new().with_opt(surface).cycle_missing(prev).any();

    let restart = DataCheck::new(rotdir_path("gdas", "INPUT/sfc_data.tile6.nc"));
    let start = if ctx.flags.replay == 2 {
        let increment = DataCheck::new(rotdir_file("gdas", "atminc.nc"));
        Deps::new()
            .data(increment)
            .with(Dependency::all_of(vec![
                Dependency::cycle_exists(prev, true),
                Dependency::artifact(restart),
            ]))
            .any()
    } else {
        Some(Dependency::artifact(restart))
    };

    Deps::new().with_opt(start).with_opt(ready).all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::specs_for;

    fn find<'a>(specs: &'a [TaskSpec], name: &str) -> &'a TaskSpec {
        specs.iter().find(|s| s.name() == name).unwrap()
    }

    #[test]
    fn plain_replay_task_list() {
        let specs = specs_for(&[("MODE", "replay")]);
        let names: Vec<_> = specs.iter().map(TaskSpec::name).collect();
        assert_eq!(
            names,
            vec!["gdasgetic", "gdasinit", "gdassfcanl", "gdasfcst", "gdasarch"]
        );
        assert_eq!(
            find(&specs, "gdasarch").dependency,
            Some(Dependency::peer("gdasfcst"))
        );
        assert_eq!(find(&specs, "gdasinit").cadence, CadenceId::Gdas);
    }

    #[test]
    fn forecast_starts_from_restart_or_first_cycle() {
        let specs = specs_for(&[("MODE", "replay")]);
        assert_eq!(
            find(&specs, "gdasfcst")
                .dependency
                .as_ref()
                .unwrap()
                .to_string(),
            "and(data ${ROTDIR}/gdas.${PDY}/${HH}/atmos/INPUT/sfc_data.tile6.nc, \
             or(task gdassfcanl, no-cycle@-06:00:00))"
        );
    }

    #[test]
    fn increment_replay_initialises_once() {
        let specs = specs_for(&[
            ("MODE", "replay"),
            ("replay", "2"),
            ("DO_CHGRES_FCST", "YES"),
        ]);
        assert_eq!(find(&specs, "gdasinit").cadence, CadenceId::First);

        let analinc = find(&specs, "gdasanalinc");
        let refs: Vec<_> = analinc
            .dependency
            .as_ref()
            .unwrap()
            .leaves()
            .into_iter()
            .filter_map(|p| p.reference().map(|(n, _)| n.to_string()))
            .collect();
        assert_eq!(refs, vec!["gdasgetic", "gdasechgres", "gdasfcst"]);
    }

    #[test]
    fn gfs_forecasts_post_and_archive() {
        let specs = specs_for(&[("MODE", "replay"), ("gfs_cyc", "1")]);
        let gfs: Vec<_> = specs
            .iter()
            .filter(|s| s.group == CycleGroup::Gfs)
            .map(TaskSpec::name)
            .collect();
        assert_eq!(gfs, vec!["gfsfcst", "gfspost", "gfsvrfy", "gfsarch"]);
        assert_eq!(
            find(&specs, "gfsarch")
                .dependency
                .as_ref()
                .unwrap()
                .to_string(),
            "and(task gfsvrfy, streq(${ARCHIVE_TO_HPSS}, YES))"
        );
    }
}
