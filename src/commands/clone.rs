//! Clone command implementation

use anyhow::Result;
use clap::Args;
use std::io;
use std::path::PathBuf;

use fleetrun::campaign::Campaign;
use fleetrun::executor::ProcessExecutor;
use fleetrun::git::{clone_campaign, CommandGit};
use fleetrun::output::OutputConfig;

use super::load_campaign_settings;

/// Arguments for the clone command
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Clone the repositories listed in FILE instead of the campaign list
    #[arg(long, value_name = "FILE")]
    pub repos: Option<PathBuf>,

    /// Host for entries that do not name one (overrides clone_host)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,
}

/// Execute the clone command
pub fn execute(args: CloneArgs, output: &OutputConfig) -> Result<()> {
    let settings = load_campaign_settings()?;
    let repo_list = args.repos.unwrap_or_else(|| settings.repos_file.clone());
    let campaign = Campaign::load(&repo_list, &settings.description_file)?;
    let host = args.host.as_deref().unwrap_or(&settings.clone_host);

    let executor = ProcessExecutor::new();
    let git = CommandGit::new(&executor);
    let summary = {
        let mut stdout = io::stdout().lock();
        clone_campaign(&git, &campaign, &settings.work_dir, host, &mut stdout)
    };

    println!();
    println!("{}", summary.summary_line("clone", output));
    Ok(())
}
