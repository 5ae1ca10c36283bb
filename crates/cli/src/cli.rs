//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// rotsink - rotating record sink
#[derive(Parser, Debug)]
#[command(
    name = "rotsink",
    author,
    version,
    about = "Write a stream of records into rotating destinations",
    long_about = "Reads newline-delimited records from a file or stdin and writes them \n\
                  through a rotating sink: destinations roll by row count and/or time \n\
                  bucket and old ones are pruned beyond the backup limit."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ROTSINK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ROTSINK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed records into a rotating sink
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display resolved configuration and the first destination path
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "rotsink.toml", env = "ROTSINK_CONFIG")]
    pub config: PathBuf,

    /// Read records from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Stop after this many records (0 = unlimited)
    #[arg(long, default_value = "0", env = "ROTSINK_MAX_RECORDS")]
    pub max_records: u64,

    /// Stop feeding after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "ROTSINK_TIMEOUT")]
    pub timeout: u64,

    /// Override the Prometheus port from configuration (0 = disabled)
    #[arg(long, env = "ROTSINK_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Validate configuration and exit without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "rotsink.toml", env = "ROTSINK_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "rotsink.toml", env = "ROTSINK_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

impl Commands {
    /// Subcommand name (for logging)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Validate(_) => "validate",
            Self::Info(_) => "info",
        }
    }
}

impl Cli {
    /// Logging setup for this invocation
    ///
    /// Metrics stay off here; `run` installs the exporter once the config
    /// file (and its port) is known.
    pub fn observability(&self) -> observability::ObservabilityConfig {
        let level = if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };

        observability::ObservabilityConfig {
            log_format: self.log_format.clone().into(),
            metrics_port: None,
            default_log_level: level.to_string(),
        }
    }
}
