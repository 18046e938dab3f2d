//! Commit command implementation
//!
//! Applies `git commit --all --message` to every working copy that has
//! changes. Missing and unchanged working copies are skipped.

use anyhow::Result;
use clap::Args;
use std::io;

use fleetrun::campaign::Campaign;
use fleetrun::executor::ProcessExecutor;
use fleetrun::git::{commit_campaign, CommandGit};
use fleetrun::output::OutputConfig;

use super::load_campaign_settings;

/// Arguments for the commit command
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Commit message to apply
    #[arg(short, long)]
    pub message: String,
}

/// Execute the commit command
pub fn execute(args: CommitArgs, output: &OutputConfig) -> Result<()> {
    let settings = load_campaign_settings()?;
    let campaign = Campaign::load(&settings.repos_file, &settings.description_file)?;

    let executor = ProcessExecutor::new();
    let git = CommandGit::new(&executor);
    let summary = {
        let mut stdout = io::stdout().lock();
        commit_campaign(
            &git,
            &campaign,
            &settings.work_dir,
            &args.message,
            &mut stdout,
        )
    };

    println!();
    println!("{}", summary.summary_line("commit", output));
    Ok(())
}
