//! # fleetrun CLI
//!
//! Binary entry point for the `fleetrun` command-line tool. Parses arguments,
//! sets up logging and hands off to the selected subcommand. All campaign
//! logic lives in the library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
