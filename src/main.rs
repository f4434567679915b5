//! Plate Checker - personalised plate availability lookup
//!
//! A CLI tool that drives a headless browser session against the EzyPlates
//! query page and reports whether a plate can still be registered.

use clap::Parser;
use env_logger::Env;

use plate_checker::cli::Cli;
use plate_checker::commands;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match commands::execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
