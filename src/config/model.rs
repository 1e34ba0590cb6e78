// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calendar::time::{parse_offset, parse_timestamp};
use crate::errors::{CycledagError, Result};
use crate::types::Mode;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [base]
/// MODE = "cycled"
/// SDATE = "2021122018"
/// EDATE = "2021122200"
/// gfs_cyc = 4
///
/// [task.fcst]
/// wtime_fcst = "01:00:00"
/// npe_fcst = 192
/// npe_node_fcst = 40
/// ```
///
/// `[base]` holds experiment-wide settings. Each `[task.<name>]` section is
/// layered on top of `[base]` when that task is resolved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExperimentConfig {
    #[serde(default)]
    pub base: ConfigScope,

    #[serde(default)]
    pub task: BTreeMap<String, ConfigScope>,
}

/// One configuration value, loosely typed the way experiment settings are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x}"),
            ConfigValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Str(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Int(i)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

/// Flat key/value mapping with typed accessors.
///
/// Scopes are never mutated once built; [`ConfigScope::extended`] and
/// [`ConfigScope::merged`] return new scopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigScope {
    values: BTreeMap<String, ConfigValue>,
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigScope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of this scope with `entries` added or replaced.
    pub fn extended<I, K, V>(&self, entries: I) -> ConfigScope
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        let mut values = self.values.clone();
        for (k, v) in entries {
            values.insert(k.into(), v.into());
        }
        ConfigScope { values }
    }

    /// Copy of this scope with every key of `overlay` layered on top.
    pub fn merged(&self, overlay: &ConfigScope) -> ConfigScope {
        self.extended(overlay.values.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    /// Boolean flag. Accepts native booleans, `YES`/`NO`, `Y`/`N`,
    /// Fortran-style `.true.`/`.false.` and `0`/`1`.
    pub fn flag(&self, key: &str, default: bool) -> Result<bool> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        match value {
            ConfigValue::Bool(b) => Ok(*b),
            ConfigValue::Int(0) => Ok(false),
            ConfigValue::Int(1) => Ok(true),
            ConfigValue::Str(s) => match s.trim().to_uppercase().as_str() {
                "YES" | "Y" | "TRUE" | ".TRUE." | "T" => Ok(true),
                "NO" | "N" | "FALSE" | ".FALSE." | "F" => Ok(false),
                _ => Err(CycledagError::invalid(key, s.as_str(), "a YES/NO flag")),
            },
            other => Err(CycledagError::invalid(key, other.to_string(), "a YES/NO flag")),
        }
    }

    pub fn int(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Int(i)) => Ok(Some(*i)),
            Some(ConfigValue::Str(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| CycledagError::invalid(key, s.as_str(), "an integer")),
            Some(other) => Err(CycledagError::invalid(key, other.to_string(), "an integer")),
        }
    }

    pub fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self.int(key)?.unwrap_or(default))
    }

    /// Non-negative integer, e.g. a core or member count.
    pub fn count(&self, key: &str) -> Result<Option<u32>> {
        match self.int(key)? {
            None => Ok(None),
            Some(i) => u32::try_from(i)
                .map(Some)
                .map_err(|_| CycledagError::invalid(key, i.to_string(), "a non-negative integer")),
        }
    }

    /// Timestamp written as `YYYYMMDDHH` (or `YYYYMMDDHHMM`).
    pub fn timestamp(&self, key: &str) -> Result<Option<NaiveDateTime>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => {
                let text = value.to_string();
                parse_timestamp(&text)
                    .map(Some)
                    .ok_or_else(|| CycledagError::invalid(key, text, "a YYYYMMDDHH timestamp"))
            }
        }
    }

    /// Duration given either as whole days (integer) or as `[-][D:]HH:MM:SS`.
    pub fn duration(&self, key: &str) -> Result<Option<Duration>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Int(days)) => whole_days(key, *days).map(Some),
            Some(value) => {
                let text = value.to_string();
                if let Ok(days) = text.trim().parse::<i64>() {
                    return whole_days(key, days).map(Some);
                }
                parse_offset(&text)
                    .map(Some)
                    .ok_or_else(|| CycledagError::invalid(key, text, "days or [D:]HH:MM:SS"))
            }
        }
    }
}

fn whole_days(key: &str, days: i64) -> Result<Duration> {
    Duration::try_days(days)
        .ok_or_else(|| CycledagError::invalid(key, days.to_string(), "a representable number of days"))
}

/// Validated experiment configuration.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    mode: Mode,
    base: ConfigScope,
    task: BTreeMap<String, ConfigScope>,
    sdate: NaiveDateTime,
    edate: NaiveDateTime,
}

impl ExperimentConfig {
    /// Internal constructor used after validation.
    pub(crate) fn new_unchecked(
        mode: Mode,
        base: ConfigScope,
        task: BTreeMap<String, ConfigScope>,
        sdate: NaiveDateTime,
        edate: NaiveDateTime,
    ) -> Self {
        Self {
            mode,
            base,
            task,
            sdate,
            edate,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn base(&self) -> &ConfigScope {
        &self.base
    }

    pub fn sdate(&self) -> NaiveDateTime {
        self.sdate
    }

    pub fn edate(&self) -> NaiveDateTime {
        self.edate
    }

    /// Names of the `[task.<name>]` sections present in the file.
    pub fn task_sections(&self) -> impl Iterator<Item = &str> {
        self.task.keys().map(String::as_str)
    }

    /// Effective scope for a task: `[base]`, then each named section in
    /// order. Later sections win.
    pub fn task_scope(&self, sections: &[&str]) -> ConfigScope {
        sections
            .iter()
            .filter_map(|name| self.task.get(*name))
            .fold(self.base.clone(), |acc, overlay| acc.merged(overlay))
    }

    /// Copy of this config whose base scope is replaced by `base`.
    pub fn with_base(&self, base: ConfigScope) -> ExperimentConfig {
        ExperimentConfig {
            base,
            ..self.clone()
        }
    }
}
