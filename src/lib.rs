// src/lib.rs

pub mod calendar;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod depend;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod resources;
pub mod summary;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::calendar::Calendar;
use crate::catalog::TaskCatalog;
use crate::cli::{CliArgs, OutputFormat};
use crate::config::ExperimentConfig;
use crate::config::loader::load_and_validate;
use crate::graph::WorkflowGraph;

/// Compile a validated experiment into its workflow graph.
///
/// This wires together:
/// - cadence derivation
/// - the mode's task catalog
/// - resource resolution, filtering and graph validation
///
/// `generated_at` is recorded as provenance only; the same config and
/// timestamp always compile to the same graph.
pub fn compile(cfg: &ExperimentConfig, generated_at: DateTime<Utc>) -> errors::Result<WorkflowGraph> {
    let calendar = Calendar::derive(cfg)?;
    let specs = TaskCatalog::new(&calendar)?.build()?;
    debug!(tasks = specs.len(), "described tasks");
    graph::assemble(&calendar, specs, generated_at)
}

/// High-level entry point used by `main.rs`.
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        let calendar = Calendar::derive(&cfg)?;
        let plan = TaskCatalog::new(&calendar)?.plan();
        print!("{}", summary::render_plan(&calendar, &plan));
        debug!("dry-run complete (no graph assembled)");
        return Ok(());
    }

    let graph = compile(&cfg, Utc::now())?;
    info!(
        mode = %graph.mode,
        entries = graph.entry_count(),
        "compiled workflow graph"
    );

    match args.format {
        OutputFormat::Summary => print!("{}", summary::render_summary(&graph)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
    }
    Ok(())
}
