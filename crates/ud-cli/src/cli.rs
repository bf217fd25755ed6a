//! CLI argument definitions for the dataset transpiler.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "ud-transpiler",
    version,
    about = "Convert CSV and JSON feeds into UrbanDataset documents",
    long_about = "Convert tabular sources into UrbanDataset JSON documents.\n\n\
                  Headers are mapped onto canonical properties, periods are built\n\
                  from date and slot columns, and local times are normalized into a\n\
                  fixed UTC offset with DST overlap and gap handling."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert every source of a run into dataset documents.
    Convert(ConvertArgs),

    /// Show how the header of a source resolves against the mapping.
    Headers(HeadersArgs),
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Run configuration (TOML).
    #[arg(long = "config", value_name = "RUN_TOML")]
    pub config: PathBuf,

    /// Source directory (overrides `source_dir`).
    #[arg(long = "source", value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Output directory (overrides `output_dir`).
    #[arg(long = "output", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Maximum records per document, 0 for unlimited (overrides `max_rows_per_document`).
    #[arg(long = "max-rows", value_name = "N")]
    pub max_rows: Option<usize>,

    /// Convert and report without writing documents or moving sources.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct HeadersArgs {
    /// Run configuration (TOML).
    #[arg(long = "config", value_name = "RUN_TOML")]
    pub config: PathBuf,

    /// Source file whose header is resolved.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
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
