//! Foreach command implementation
//!
//! Runs one command in every working copy of the campaign, streaming its
//! output, and writes a new result set. Per-repository failures are counted
//! and reported but never change the exit status.

use anyhow::{anyhow, Result};
use clap::Args;
use std::io;
use std::path::PathBuf;

use fleetrun::executor::{format_command, ProcessExecutor};
use fleetrun::output::{emoji, OutputConfig};
use fleetrun::runner::{self, Selection};

use super::load_campaign_settings;

/// Arguments for the foreach command
#[derive(Args, Debug)]
pub struct ForeachArgs {
    /// Run against the repositories listed in FILE instead of the campaign list
    #[arg(long, value_name = "FILE")]
    pub repos: Option<PathBuf>,

    /// Run against the repositories that succeeded in the previous run
    #[arg(long)]
    pub successful: bool,

    /// Run against the repositories that failed in the previous run
    #[arg(long)]
    pub failed: bool,

    /// Directory in which result sets are created
    #[arg(long, value_name = "PATH", env = "FLEETRUN_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    /// Command to run in each working copy, followed by its arguments
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Execute the foreach command
pub fn execute(args: ForeachArgs, output: &OutputConfig) -> Result<()> {
    let selection = Selection::from_flags(args.repos, args.successful, args.failed)?;
    let (command, command_args) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow!("No command given"))?;

    let mut settings = load_campaign_settings()?;
    if args.results_dir.is_some() {
        settings.results_dir = args.results_dir;
    }

    let executor = ProcessExecutor::new();
    let report = {
        let mut stdout = io::stdout().lock();
        runner::foreach(
            &settings,
            &selection,
            command,
            command_args,
            &executor,
            &mut stdout,
        )?
    };

    println!();
    println!("{}", report.summary.summary_line("foreach", output));
    println!("View the output logs in: {}", report.result_set.root().display());

    if report.summary.has_errors() {
        let hint = emoji(output, "💡", "Hint:");
        println!(
            "{} Retry the failed repositories with: fleetrun foreach --failed -- {}",
            hint,
            format_command(command, command_args)
        );
        if report.summary.done > 0 {
            println!(
                "{} Continue with the successful repositories with: fleetrun foreach --successful -- <command>",
                hint
            );
        }
    }

    Ok(())
}
