//! Open Business Repository CLI.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use obr_cli::commands::{fields_table, run_process, run_validate, validation_table};
use obr_cli::logging::{LogConfig, LogFormat, init_logging};
use obr_cli::settings::{DATA_ROOT_ENV, Settings};
use obr_cli::summary::print_summary;
use obr_ingest::PathLayout;
use obr_transform::ProcessOptions;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    let settings = Settings::load(cli.config.as_deref()).context("load settings")?;
    let layout = PathLayout::new(
        settings.data_root(cli.data_root.as_deref(), std::env::var_os(DATA_ROOT_ENV)),
    );

    match &cli.command {
        Command::Process(args) => {
            let parser = settings
                .address_parser(args.address_parser, args.parser_command.as_deref())
                .context("configure address parser")?;
            let options = ProcessOptions {
                layout,
                fetch: args.fetch,
                blank_fill: args.blank_fill,
            };
            let outcomes = run_process(&args.sources, &options, parser.as_ref());
            print_summary(&outcomes);
            Ok(if outcomes.iter().any(|o| o.is_failure()) { 1 } else { 0 })
        }
        Command::Validate(args) => {
            let outcomes = run_validate(&args.sources, &layout);
            println!("{}", validation_table(&outcomes));
            Ok(if outcomes.iter().any(|o| o.result.is_err()) { 1 } else { 0 })
        }
        Command::Fields => {
            println!("{}", fields_table());
            Ok(0)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
