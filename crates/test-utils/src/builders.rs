#![allow(dead_code)]

use std::collections::BTreeMap;

use cycledag::calendar::Calendar;
use cycledag::catalog::TaskCatalog;
use cycledag::config::{ConfigScope, ConfigValue, ExperimentConfig, RawExperimentConfig};
use cycledag::types::Mode;

/// Settings every experiment built here starts from.
const BASE: &[(&str, &str)] = &[
    ("SDATE", "2021122018"),
    ("EDATE", "2021122500"),
    ("PSLOT", "c96test"),
    ("ROTDIR", "/scratch/c96test/COMROT"),
    ("ICSDIR", "/scratch/ics"),
    ("DMPDIR", "/scratch/dump"),
    ("EXPDIR", "/home/exp/c96test"),
    ("HOMEgfs", "/home/global-workflow"),
    ("ACCOUNT", "fv3-cpu"),
    ("QUEUE", "batch"),
    ("QUEUE_SERVICE", "service"),
    ("PARTITION_BATCH", "hera"),
    ("SCHEDULER", "slurm"),
];

/// Builder for `ExperimentConfig` to simplify test setup.
///
/// Unless disabled, `build()` gives every planned task a walltime and core
/// counts so the graph compiles without listing them one by one.
#[derive(Debug, Clone)]
pub struct ExperimentConfigBuilder {
    base: BTreeMap<String, ConfigValue>,
    task: BTreeMap<String, BTreeMap<String, ConfigValue>>,
    fill_resources: bool,
}

impl ExperimentConfigBuilder {
    pub fn new(mode: Mode) -> Self {
        let mut base: BTreeMap<String, ConfigValue> = BASE
            .iter()
            .map(|(k, v)| (k.to_string(), ConfigValue::from(*v)))
            .collect();
        base.insert("MODE".into(), mode.as_str().into());
        if mode == Mode::EnsRegrid {
            base.insert("CYCLE_FREQ".into(), 4_i64.into());
        }
        Self {
            base,
            task: BTreeMap::new(),
            fill_resources: true,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.base.insert(key.to_string(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.base.remove(key);
        self
    }

    /// Set `key` inside `[task.<section>]`.
    pub fn with_task(mut self, section: &str, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.task
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }

    pub fn without_default_resources(mut self) -> Self {
        self.fill_resources = false;
        self
    }

    pub fn raw(&self) -> RawExperimentConfig {
        let mut base: ConfigScope = self.base.clone().into_iter().collect();
        if self.fill_resources {
            base = base.extended(self.default_resources(&base));
        }
        RawExperimentConfig {
            base,
            task: self
                .task
                .iter()
                .map(|(name, entries)| (name.clone(), entries.clone().into_iter().collect()))
                .collect(),
        }
    }

    pub fn build(self) -> ExperimentConfig {
        ExperimentConfig::try_from(self.raw()).expect("Failed to build valid config from builder")
    }

    /// The same experiment written as a TOML file body.
    pub fn to_toml(&self) -> String {
        let raw = self.raw();
        let mut out = String::from("[base]\n");
        for key in raw.base.keys() {
            if let Some(value) = raw.base.get(key) {
                out.push_str(&format!("{key} = {}\n", toml_value(value)));
            }
        }
        for (name, scope) in &raw.task {
            out.push_str(&format!("\n[task.{name}]\n"));
            for key in scope.keys() {
                if let Some(value) = scope.get(key) {
                    out.push_str(&format!("{key} = {}\n", toml_value(value)));
                }
            }
        }
        out
    }

    /// `wtime_`/`npe_`/`npe_node_` for every task the experiment plans,
    /// leaving keys already set untouched.
    fn default_resources(&self, base: &ConfigScope) -> Vec<(String, ConfigValue)> {
        let raw = RawExperimentConfig {
            base: base.clone(),
            task: BTreeMap::new(),
        };
        let Ok(cfg) = ExperimentConfig::try_from(raw) else {
            return Vec::new();
        };
        let Ok(calendar) = Calendar::derive(&cfg) else {
            return Vec::new();
        };
        let Ok(catalog) = TaskCatalog::new(&calendar) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for group in catalog.plan().groups() {
            for task in &group.tasks {
                let name = task.as_str();
                let defaults: [(String, ConfigValue); 3] = [
                    (format!("wtime_{name}"), "00:30:00".into()),
                    (format!("npe_{name}"), 40_i64.into()),
                    (format!("npe_node_{name}"), 40_i64.into()),
                ];
                out.extend(defaults.into_iter().filter(|(k, _)| !base.contains(k)));
            }
        }
        out
    }
}

fn toml_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Str(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
