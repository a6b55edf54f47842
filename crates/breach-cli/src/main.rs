//! breach-import - bulk-import credential dumps into a database table

mod cli;
mod commands;
mod output;
mod settings;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Cli, SinkKind};
use output::colors;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.doctor && cli.sink == SinkKind::Mysql && cli.user.is_none() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "Argument --user is mandatory for the mysql sink",
            )
            .exit();
    }

    setup_logging(cli.verbose);
    if !cli.use_color() {
        colored::control::set_override(false);
    }

    let result = if cli.doctor {
        commands::doctor::run(&cli)
    } else {
        commands::import::run(&cli)
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", colors::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("breach_core=debug,breach_importer=debug,breach_cli=debug,warn")
        } else {
            EnvFilter::new("breach_core=info,breach_importer=info,breach_cli=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
