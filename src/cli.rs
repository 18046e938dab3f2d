//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use fleetrun::output::OutputConfig;

use crate::commands;

/// fleetrun - Run commands across many repositories and track the results
#[derive(Parser, Debug)]
#[command(name = "fleetrun")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new campaign directory
    Init(commands::init::InitArgs),

    /// Clone every repository of the campaign into the work directory
    Clone(commands::clone::CloneArgs),

    /// Commit pending changes in every working copy
    Commit(commands::commit::CommitArgs),

    /// Run a command in every working copy and record the results
    Foreach(commands::foreach::ForeachArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &output),
            Commands::Clone(args) => commands::clone::execute(args, &output),
            Commands::Commit(args) => commands::commit::execute(args, &output),
            Commands::Foreach(args) => commands::foreach::execute(args, &output),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second initialisation only happens in tests.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
