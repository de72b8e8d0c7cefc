//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tabulax_model::TransformationCategory;

#[derive(Parser)]
#[command(
    name = "tabulax",
    version,
    about = "TabulaX - learn, apply and fuzzy-join column transformations",
    long_about = "Learn a column transformation from source/target examples, apply it to \
                  a table, and join the result against another table.\n\n\
                  Tables are CSV (header row, empty cell = null) or JSON arrays of row \
                  objects, chosen by file extension."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include cell values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Configuration file (default: ./tabulax.toml when present).
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Learn a transformation from an examples table.
    Learn(LearnArgs),

    /// Apply a stored transformation to a table column.
    Apply(ApplyArgs),

    /// Fuzzy-join a source table to a target table.
    Join(JoinArgs),
}

#[derive(Parser)]
pub struct LearnArgs {
    /// Table holding the example pairs.
    #[arg(value_name = "EXAMPLES")]
    pub examples: PathBuf,

    #[arg(long = "source-column", value_name = "COLUMN")]
    pub source_column: String,

    #[arg(long = "target-column", value_name = "COLUMN")]
    pub target_column: String,

    /// Transformation name (default: the examples file stem).
    #[arg(long = "name")]
    pub name: Option<String>,

    #[arg(long = "owner")]
    pub owner: Option<String>,

    /// Where to write the transformation record (default: stdout).
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Transformation record written by `learn`.
    #[arg(value_name = "TRANSFORMATION")]
    pub transformation: PathBuf,

    #[arg(value_name = "TABLE")]
    pub table: PathBuf,

    #[arg(long = "input-column", value_name = "COLUMN")]
    pub input_column: String,

    #[arg(long = "output-column", value_name = "COLUMN")]
    pub output_column: String,

    /// Where to write the result table (default: JSON on stdout).
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Worker threads (default: available parallelism).
    #[arg(long = "workers")]
    pub workers: Option<usize>,

    /// Rows not started within this many seconds are reported as cancelled.
    #[arg(long = "deadline-secs", value_name = "SECONDS")]
    pub deadline_secs: Option<f64>,
}

#[derive(Parser)]
pub struct JoinArgs {
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    #[arg(long = "source-column", value_name = "COLUMN")]
    pub source_column: String,

    #[arg(long = "target-column", value_name = "COLUMN")]
    pub target_column: String,

    /// Transformation category deciding how values are compared.
    #[arg(long = "category", value_parser = parse_category)]
    pub category: TransformationCategory,

    /// Largest accepted distance (default: 1).
    #[arg(long = "max-distance", value_name = "DISTANCE")]
    pub max_distance: Option<f64>,

    /// Drop source rows without a match instead of keeping them with nulls.
    #[arg(long = "omit-unmatched")]
    pub omit_unmatched: bool,

    /// Compare text case-insensitively.
    #[arg(long = "ignore-case")]
    pub ignore_case: bool,

    /// Trim and collapse whitespace before comparing text.
    #[arg(long = "trim")]
    pub trim: bool,

    #[arg(long = "workers")]
    pub workers: Option<usize>,

    /// Where to write the joined table (default: JSON on stdout).
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

fn parse_category(value: &str) -> Result<TransformationCategory, String> {
    value.parse().map_err(|err: tabulax_model::ModelError| err.to_string())
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
