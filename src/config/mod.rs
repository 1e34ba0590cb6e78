// src/config/mod.rs

//! Experiment configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the experiment-wide invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigScope, ConfigValue, ExperimentConfig, RawExperimentConfig};
pub use validate::scheduler_kind;
