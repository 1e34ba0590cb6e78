// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ExperimentConfig, RawExperimentConfig};
use crate::errors::Result;

/// Load an experiment file from a given path and return the raw
/// `RawExperimentConfig`.
///
/// This only performs TOML deserialization; it does **not** check modes,
/// dates or the scheduler. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawExperimentConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawExperimentConfig = toml::from_str(&contents)?;
    debug!(
        path = %path.display(),
        base_keys = config.base.len(),
        task_sections = config.task.len(),
        "loaded experiment file"
    );

    Ok(config)
}

/// Load an experiment file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Resolves the experiment mode.
/// - Checks `SDATE`/`EDATE` and the scheduler family.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ExperimentConfig> {
    let raw_config = load_from_path(&path)?;
    let config = ExperimentConfig::try_from(raw_config)?;
    Ok(config)
}

/// `experiment.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("experiment.toml")
}
