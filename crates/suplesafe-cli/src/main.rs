//! Supplement safety validation CLI.

use std::io::{self, IsTerminal};

use clap::Parser;

mod cli;
mod commands;
mod logging;
mod output;

use crate::cli::{Cli, Command, LogFormatArg, RulesCommand};
use crate::commands::{
    run_check, run_convert, run_rules_dump, run_rules_validate, run_validate,
};
use crate::logging::{init_logging, LogConfig, LogFormat};

fn main() {
    let cli = Cli::parse();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let outcome = match &cli.command {
        Command::Validate(args) => run_validate(&cli, args),
        Command::Check(args) => run_check(&cli, args),
        Command::Convert(args) => run_convert(args),
        Command::Rules(RulesCommand::Validate { file }) => run_rules_validate(file),
        Command::Rules(RulesCommand::Dump { format }) => run_rules_dump(&cli, *format),
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::from_verbosity(cli.verbose, cli.quiet)
        .with_format(format)
        .with_ansi(io::stderr().is_terminal())
}
