// src/catalog/env.rs

//! Environment bindings passed to each job.

use chrono::Duration;
use serde::Serialize;

use crate::calendar::time::serialize_opt_hms;
use crate::types::CycleGroup;

/// Cycle-time rendering for a [`EnvValue::CycleTime`] binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleFormat {
    /// `YYYYMMDDHH`
    Ymdh,
    /// `YYYYMMDD`
    Ymd,
    /// `HH`
    H,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvValue {
    /// Literal text, possibly holding `${NAME}` placeholders.
    Text { value: String },
    /// The cycle time, optionally shifted.
    CycleTime {
        format: CycleFormat,
        #[serde(serialize_with = "serialize_opt_hms", skip_serializing_if = "Option::is_none")]
        offset: Option<Duration>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvBinding {
    pub name: String,
    pub value: EnvValue,
}

impl EnvBinding {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: EnvValue::Text {
                value: value.into(),
            },
        }
    }

    pub fn cycle(name: impl Into<String>, format: CycleFormat, offset: Option<Duration>) -> Self {
        Self {
            name: name.into(),
            value: EnvValue::CycleTime { format, offset },
        }
    }

    /// Text value referencing a fan-out variable.
    pub fn fan_out_var(name: impl Into<String>, var: &str) -> Self {
        Self::text(name, format!("${{{var}}}"))
    }
}

/// Bindings every job of `group` receives.
pub fn cycle_bindings(run_envir: &str, group: CycleGroup) -> Vec<EnvBinding> {
    vec![
        EnvBinding::text("RUN_ENVIR", run_envir),
        EnvBinding::text("HOMEgfs", "${HOMEgfs}"),
        EnvBinding::text("EXPDIR", "${EXPDIR}"),
        EnvBinding::cycle("CDATE", CycleFormat::Ymdh, None),
        EnvBinding::text("CDUMP", group.label()),
        EnvBinding::cycle("PDY", CycleFormat::Ymd, None),
        EnvBinding::cycle("cyc", CycleFormat::H, None),
    ]
}

/// Bindings naming the previous primary cycle.
pub fn previous_cycle_bindings(interval: Duration) -> Vec<EnvBinding> {
    let back = Some(-interval);
    vec![
        EnvBinding::cycle("GDATE", CycleFormat::Ymdh, back),
        EnvBinding::text("GDUMP", "gdas"),
        EnvBinding::cycle("gPDY", CycleFormat::Ymd, back),
        EnvBinding::cycle("gcyc", CycleFormat::H, back),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_bindings_name_the_group() {
        let env = cycle_bindings("emc", CycleGroup::Gfs);
        let cdump = env.iter().find(|b| b.name == "CDUMP").unwrap();
        assert_eq!(
            cdump.value,
            EnvValue::Text {
                value: "gfs".into()
            }
        );
        assert_eq!(env.len(), 7);
    }

    #[test]
    fn fan_out_var_is_a_placeholder() {
        let b = EnvBinding::fan_out_var("FHRGRP", "grp");
        assert_eq!(
            b.value,
            EnvValue::Text {
                value: "${grp}".into()
            }
        );
    }
}
