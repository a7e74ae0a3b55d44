//! norns-edit CLI Binary
//!
//! Command-line interface for browsing and editing a norns dust directory.

use clap::Parser;
use norns_edit::logging::init_logging;
use norns_edit::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.workspace.clone(), cli.config.clone(), cli.root.clone())
    {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing workspace: {:#}", e);
            process::exit(1);
        }
    };

    let mut logging = context.config().logging.clone();
    cli.apply_log_overrides(&mut logging);
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
