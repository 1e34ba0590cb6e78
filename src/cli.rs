// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cycledag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cycledag",
    version,
    about = "Compile a forecast experiment config into a cycled task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the experiment config (TOML).
    ///
    /// Default: `experiment.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "experiment.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CYCLEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// How to print the compiled graph.
    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    pub format: OutputFormat,

    /// Validate the config and print the task plan, without resolving
    /// resources or assembling the graph.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable cadences, tasks and dependency trees.
    Summary,
    /// The graph as pretty-printed JSON.
    Json,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["cycledag"]).unwrap();
        assert_eq!(args.config, "experiment.toml");
        assert_eq!(args.format, OutputFormat::Summary);
        assert!(!args.dry_run && args.log_level.is_none());
    }

    #[test]
    fn json_format_and_level() {
        let args = CliArgs::try_parse_from([
            "cycledag",
            "--config",
            "c96.toml",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
