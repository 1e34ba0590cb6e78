// src/config/validate.rs

use tracing::debug;

use crate::config::model::{ConfigScope, ExperimentConfig, RawExperimentConfig};
use crate::errors::{CycledagError, Result};
use crate::types::{Mode, SchedulerKind};

impl TryFrom<RawExperimentConfig> for ExperimentConfig {
    type Error = crate::errors::CycledagError;

    fn try_from(raw: RawExperimentConfig) -> std::result::Result<Self, Self::Error> {
        let mode = resolve_mode(&raw.base)?;
        let (sdate, edate) = validate_window(&raw.base)?;
        scheduler_kind(&raw.base)?;
        debug!(%mode, %sdate, %edate, "validated experiment config");
        Ok(ExperimentConfig::new_unchecked(
            mode, raw.base, raw.task, sdate, edate,
        ))
    }
}

fn resolve_mode(base: &ConfigScope) -> Result<Mode> {
    match base.string("MODE") {
        Some(text) => text.parse::<Mode>().map_err(CycledagError::UnknownMode),
        None if base.contains("CYCLE_FREQ") => Ok(Mode::EnsRegrid),
        None => Err(CycledagError::missing("[base]", "MODE")),
    }
}

fn validate_window(
    base: &ConfigScope,
) -> Result<(chrono::NaiveDateTime, chrono::NaiveDateTime)> {
    let sdate = base
        .timestamp("SDATE")?
        .ok_or_else(|| CycledagError::missing("[base]", "SDATE"))?;
    let edate = base
        .timestamp("EDATE")?
        .ok_or_else(|| CycledagError::missing("[base]", "EDATE"))?;

    if sdate > edate {
        return Err(CycledagError::ConfigError(format!(
            "SDATE ({}) must not be later than EDATE ({})",
            sdate.format("%Y%m%d%H"),
            edate.format("%Y%m%d%H")
        )));
    }
    Ok((sdate, edate))
}

/// Scheduler family from `SCHEDULER`, else from the `machine` name.
pub fn scheduler_kind(base: &ConfigScope) -> Result<SchedulerKind> {
    if let Some(text) = base.string("SCHEDULER") {
        return text
            .parse::<SchedulerKind>()
            .map_err(|_| CycledagError::invalid("SCHEDULER", text, "slurm, pbspro, lsf or cobalt"));
    }
    match base.string("machine") {
        Some(machine) => SchedulerKind::for_machine(&machine).ok_or_else(|| {
            CycledagError::ConfigError(format!(
                "no scheduler known for machine '{machine}'; set SCHEDULER in [base]"
            ))
        }),
        None => Err(CycledagError::ConfigError(
            "[base] must set SCHEDULER or machine".to_string(),
        )),
    }
}
