// src/calendar/mod.rs

//! Cycle calendar: which cadences exist for an experiment and the derived
//! configuration values that depend on them.
//!
//! [`Calendar::derive`] never mutates the input config. Derived values
//! (`gfs_cyc` after coercion, `SDATE_GFS`, `EDATE_GFS`, `INTERVAL_GFS`,
//! `INTERVAL`, `CDUMP` and the per-hour `FHMAX_GFS_<HH>` table) live in a
//! copy available through [`Calendar::config`].

pub mod cadence;
pub mod time;

use chrono::Duration;
use tracing::info;

use crate::config::{ConfigScope, ConfigValue, ExperimentConfig};
use crate::errors::{CycledagError, Result};
use crate::types::{CadenceId, CycleGroup, Mode};

pub use cadence::{
    Alignment, Cadence, CycleFrequency, SecondaryCadence, resolve_secondary_cadence,
};
pub use time::{format_hms, format_ymdh, parse_offset, parse_timestamp};

/// Default forecast length in hours when no `FHMAX_GFS_*` key is set.
const DEFAULT_FHMAX_GFS: i64 = 120;

/// Every cadence an experiment uses plus the config derived from them.
#[derive(Debug, Clone)]
pub struct Calendar {
    primary_group: CycleGroup,
    cadences: Vec<Cadence>,
    secondary: Option<SecondaryCadence>,
    derived: ExperimentConfig,
}

impl Calendar {
    pub fn derive(cfg: &ExperimentConfig) -> Result<Self> {
        let base = cfg.base();
        let (sdate, edate) = (cfg.sdate(), cfg.edate());
        let six_hours = Duration::hours(6);

        let mut cadences = Vec::new();
        let mut secondary = None;
        let mut extra: Vec<(String, ConfigValue)> = Vec::new();

        let primary_group = match cfg.mode() {
            Mode::Cycled | Mode::Replay => {
                if cfg.mode() == Mode::Replay {
                    cadences.push(Cadence::new(CadenceId::First, sdate, sdate, six_hours));
                }
                cadences.push(Cadence::new(CadenceId::Gdas, sdate, edate, six_hours));

                let requested = CycleFrequency::from_count(base.int_or("gfs_cyc", 0)?)?;
                let delay = base.duration("gfs_delay")?.unwrap_or_else(Duration::zero);
                if delay < Duration::zero() {
                    return Err(CycledagError::invalid(
                        "gfs_delay",
                        format_hms(delay),
                        "a non-negative delay",
                    ));
                }
                let resolved =
                    resolve_secondary_cadence(sdate, edate, Alignment::synoptic(), delay, requested);
                extra.extend(secondary_entries(base, &resolved)?);
                if resolved.cadence.valid {
                    cadences.push(resolved.cadence.clone());
                }
                secondary = Some(resolved);
                CycleGroup::Gdas
            }
            Mode::ForecastOnly => {
                let do_gomg = base.flag("DO_OmF", false)?;
                let group = match base.string("CDUMP") {
                    Some(s) => s
                        .parse::<CycleGroup>()
                        .map_err(|_| CycledagError::invalid("CDUMP", s, "gdas or gfs"))?,
                    None if do_gomg => CycleGroup::Gdas,
                    None => CycleGroup::Gfs,
                };
                let interval = match interval_days(base)? {
                    Some(days) => days,
                    None => CycleFrequency::from_count(base.int_or("gfs_cyc", 0)?)?
                        .interval()
                        .unwrap_or(six_hours),
                };
                cadences.push(Cadence::new(group.default_cadence(), sdate, edate, interval));
                if do_gomg {
                    cadences.push(Cadence::new(
                        CadenceId::Gomg,
                        sdate + six_hours,
                        edate + six_hours,
                        interval,
                    ));
                }
                extra.push(("INTERVAL".into(), format_hms(interval).into()));
                group
            }
            Mode::Omf => {
                let interval = interval_days(base)?.unwrap_or(six_hours);
                cadences.push(Cadence::new(CadenceId::Gdas, sdate, edate, interval));
                extra.push(("INTERVAL".into(), format_hms(interval).into()));
                CycleGroup::Gdas
            }
            Mode::EnsRegrid => {
                let count = base
                    .int("CYCLE_FREQ")?
                    .ok_or_else(|| CycledagError::missing("[base]", "CYCLE_FREQ"))?;
                let interval = CycleFrequency::from_count(count)
                    .ok()
                    .and_then(|f| f.interval())
                    .ok_or_else(|| {
                        CycledagError::invalid("CYCLE_FREQ", count.to_string(), "1, 2 or 4")
                    })?;
                cadences.push(Cadence::new(CadenceId::Gdas, sdate, edate, interval));
                extra.push(("INTERVAL".into(), format_hms(interval).into()));
                CycleGroup::Gdas
            }
        };

        extra.push(("CDUMP".into(), primary_group.label().into()));
        let derived = cfg.with_base(base.extended(extra));

        info!(
            mode = %cfg.mode(),
            cadences = cadences.len(),
            "derived cycle calendar"
        );

        Ok(Self {
            primary_group,
            cadences,
            secondary,
            derived,
        })
    }

    /// Group whose cadence spans the whole experiment window.
    pub fn primary_group(&self) -> CycleGroup {
        self.primary_group
    }

    /// Valid cadences in emission order.
    pub fn cadences(&self) -> &[Cadence] {
        &self.cadences
    }

    pub fn cadence(&self, id: CadenceId) -> Option<&Cadence> {
        self.cadences.iter().find(|c| c.id == id)
    }

    pub fn is_valid(&self, id: CadenceId) -> bool {
        self.cadence(id).is_some_and(|c| c.valid)
    }

    /// Interval of a cadence, if it exists.
    pub fn interval(&self, id: CadenceId) -> Option<Duration> {
        self.cadence(id).map(|c| c.interval)
    }

    pub fn secondary(&self) -> Option<&SecondaryCadence> {
        self.secondary.as_ref()
    }

    /// Experiment config extended with calendar-derived values.
    pub fn config(&self) -> &ExperimentConfig {
        &self.derived
    }
}

fn interval_days(base: &ConfigScope) -> Result<Option<Duration>> {
    match base.int("interval_days")? {
        Some(days) if days > 0 => Duration::try_days(days).map(Some).ok_or_else(|| {
            CycledagError::invalid("interval_days", days.to_string(), "a representable number of days")
        }),
        _ => Ok(None),
    }
}

fn secondary_entries(
    base: &ConfigScope,
    resolved: &SecondaryCadence,
) -> Result<Vec<(String, ConfigValue)>> {
    let cadence = &resolved.cadence;
    let mut out: Vec<(String, ConfigValue)> = vec![
        ("gfs_cyc".into(), resolved.frequency.per_day().into()),
        ("INTERVAL_GFS".into(), format_hms(cadence.interval).into()),
    ];
    // a disabled cadence has no window to report
    if cadence.valid {
        out.push(("SDATE_GFS".into(), format_ymdh(cadence.start).into()));
        out.push(("EDATE_GFS".into(), format_ymdh(cadence.end).into()));
    }

    let fallback = base.int_or("FHMAX_GFS_00", DEFAULT_FHMAX_GFS)?;
    for hh in ["00", "06", "12", "18"] {
        let key = format!("FHMAX_GFS_{hh}");
        let value = base.int_or(&key, fallback)?;
        out.push((key, value.into()));
    }
    Ok(out)
}

/// Longest `FHMAX_GFS_<HH>` across the four synoptic hours.
pub fn fhmax_gfs_longest(scope: &ConfigScope) -> Result<i64> {
    let fallback = scope.int_or("FHMAX_GFS_00", DEFAULT_FHMAX_GFS)?;
    let mut longest = fallback;
    for hh in ["00", "06", "12", "18"] {
        longest = longest.max(scope.int_or(&format!("FHMAX_GFS_{hh}"), fallback)?);
    }
    Ok(longest)
}
