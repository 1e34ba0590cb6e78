// src/types.rs

//! Small closed vocabularies shared across the compiler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of experiment being compiled.
///
/// Each mode selects its own task catalog and its own cadence rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Cycled,
    ForecastOnly,
    Replay,
    Omf,
    EnsRegrid,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Cycled,
        Mode::ForecastOnly,
        Mode::Replay,
        Mode::Omf,
        Mode::EnsRegrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Cycled => "cycled",
            Mode::ForecastOnly => "forecast-only",
            Mode::Replay => "replay",
            Mode::Omf => "omf",
            Mode::EnsRegrid => "ens-regrid",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "cycled" => Ok(Mode::Cycled),
            "forecast-only" | "forecastonly" => Ok(Mode::ForecastOnly),
            "replay" => Ok(Mode::Replay),
            "omf" => Ok(Mode::Omf),
            "ens-regrid" | "ensregrid" => Ok(Mode::EnsRegrid),
            other => Err(other.to_string()),
        }
    }
}

/// Named family of cycles sharing a cadence and a task-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleGroup {
    Gdas,
    Gfs,
}

impl CycleGroup {
    pub fn label(&self) -> &'static str {
        match self {
            CycleGroup::Gdas => "gdas",
            CycleGroup::Gfs => "gfs",
        }
    }

    /// Cadence this group runs on unless a task overrides it.
    pub fn default_cadence(&self) -> CadenceId {
        match self {
            CycleGroup::Gdas => CadenceId::Gdas,
            CycleGroup::Gfs => CadenceId::Gfs,
        }
    }
}

impl fmt::Display for CycleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CycleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gdas" => Ok(CycleGroup::Gdas),
            "gfs" => Ok(CycleGroup::Gfs),
            other => Err(format!("invalid cycle group: {other} (expected \"gdas\" or \"gfs\")")),
        }
    }
}

/// Identifier of a cadence in the compiled graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceId {
    /// Single cycle at the experiment start.
    First,
    Gdas,
    Gfs,
    /// Observation-minus-forecast verification, one primary interval behind.
    Gomg,
}

impl CadenceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CadenceId::First => "first",
            CadenceId::Gdas => "gdas",
            CadenceId::Gfs => "gfs",
            CadenceId::Gomg => "gomg",
        }
    }
}

impl fmt::Display for CadenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch scheduler family of the target machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    Slurm,
    PbsPro,
    Lsf,
    Cobalt,
}

impl SchedulerKind {
    /// Family used by a known machine name.
    pub fn for_machine(machine: &str) -> Option<Self> {
        match machine.trim().to_uppercase().as_str() {
            "HERA" | "ORION" | "JET" | "S4" | "GAEA" => Some(SchedulerKind::Slurm),
            "WCOSS2" => Some(SchedulerKind::PbsPro),
            "WCOSS_DELL_P3" | "WCOSS_C" => Some(SchedulerKind::Lsf),
            _ => None,
        }
    }

    /// Whether jobs are routed with a partition in addition to a queue.
    pub fn uses_partitions(&self) -> bool {
        matches!(self, SchedulerKind::Slurm)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerKind::Slurm => "slurm",
            SchedulerKind::PbsPro => "pbspro",
            SchedulerKind::Lsf => "lsf",
            SchedulerKind::Cobalt => "cobalt",
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slurm" => Ok(SchedulerKind::Slurm),
            "pbspro" | "pbs" => Ok(SchedulerKind::PbsPro),
            "lsf" | "lsfcray" => Ok(SchedulerKind::Lsf),
            "cobalt" => Ok(SchedulerKind::Cobalt),
            other => Err(format!(
                "invalid scheduler: {other} (expected slurm, pbspro, lsf or cobalt)"
            )),
        }
    }
}
