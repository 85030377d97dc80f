//! CLI argument definitions for `obr`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use obr_cli::settings::ParserKind;

#[derive(Parser)]
#[command(
    name = "obr",
    version,
    about = "Open Business Repository - standardize business registry datasets",
    long_about = "Convert business registry datasets (CSV or XML) into one standard CSV schema.\n\n\
                  Each dataset is described by a JSON metadata document naming its file,\n\
                  format and the mapping from standard fields to source columns or elements."
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

    /// Settings file (default: ./obr.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Data root holding raw/, dirty/ and clean/ (default: pddir).
    #[arg(long = "data-root", value_name = "DIR", global = true)]
    pub data_root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline for each metadata document.
    Process(ProcessArgs),

    /// Check metadata documents without reading any data.
    Validate(ValidateArgs),

    /// List the standard output fields.
    Fields,
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Metadata documents (JSON), processed in order.
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<PathBuf>,

    /// Download a missing raw file from the document's url.
    #[arg(long = "fetch")]
    pub fetch: bool,

    /// Add every absent standard column, empty, to the clean file.
    #[arg(long = "blank-fill")]
    pub blank_fill: bool,

    /// Address parser used for full_addr values.
    #[arg(long = "address-parser", value_enum)]
    pub address_parser: Option<ParserKind>,

    /// Command line of the external address parser, split on whitespace.
    #[arg(long = "parser-command", value_name = "CMD")]
    pub parser_command: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Metadata documents (JSON).
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
