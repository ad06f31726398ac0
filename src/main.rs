//! `jumpstart` command-line entry point.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use jumpstart::cli::{Cli, Command};
use jumpstart::commands;
use jumpstart::logging::{self, Logger};

/// Install the global subscriber and create the logger for `command`.
fn logger(verbose: bool, command: &str) -> Arc<Logger> {
    logging::init_subscriber(verbose, command);
    Arc::new(Logger::new(command))
}

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    match &args.command {
        Command::List(opts) => {
            commands::list::run(&args.global, opts, &logger(args.verbose, "list"))
        }
        Command::Run(opts) => commands::run::run(&args.global, opts, &logger(args.verbose, "run")),
        Command::Check => commands::check::run(&args.global, &logger(args.verbose, "check")),
        Command::Completions(opts) => {
            commands::completions::run(opts);
            Ok(())
        }
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
