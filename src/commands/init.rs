//! # Init Command Implementation
//!
//! Creates a new campaign directory:
//!
//! ```text
//! <name>/
//!   .gitignore        ignores work/ and the latest-results pointer
//!   .fleetrun.yaml    commented default settings
//!   README.md         PR title and body
//!   repos.txt         repository list
//!   work/             working copies
//! ```

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::Path;

use fleetrun::output::{OutputConfig, Tone};
use fleetrun::settings::{Settings, SETTINGS_FILE};

/// Create a new campaign directory
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Campaign name, also used as the directory and branch name
    #[arg(short, long)]
    pub name: String,

    /// Overwrite the files of an existing campaign directory
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, output: &OutputConfig) -> Result<()> {
    let campaign_dir = Path::new(&args.name);

    if campaign_dir.exists() && !args.force {
        anyhow::bail!(
            "Campaign directory '{}' already exists. Use --force to overwrite.",
            args.name
        );
    }

    let work_dir = campaign_dir.join("work");
    fs::create_dir_all(&work_dir)
        .with_context(|| format!("Unable to create {}", work_dir.display()))?;

    let files = [
        (".gitignore", gitignore()),
        (SETTINGS_FILE, Settings::template().to_string()),
        ("README.md", readme(&args.name)),
        ("repos.txt", repos_list()),
    ];
    for (name, content) in files {
        let path = campaign_dir.join(name);
        fs::write(&path, content)
            .with_context(|| format!("Unable to write {}", path.display()))?;
        log::debug!("Wrote {}", path.display());
    }

    println!(
        "{} Created campaign '{}' in {}",
        output.marker(Tone::Success),
        args.name,
        campaign_dir.display()
    );
    println!("Next steps:");
    println!("  1. cd {}", campaign_dir.display());
    println!("  2. List the target repositories in repos.txt");
    println!("  3. Write the pull request title and body in README.md");
    println!("  4. Run `fleetrun clone`, then `fleetrun foreach -- <command>`");

    Ok(())
}

fn gitignore() -> String {
    let pointer = Settings::default().latest_results;
    format!("/work/\n/{}\n", pointer.display())
}

fn readme(name: &str) -> String {
    format!(
        r#"# {name}

Describe the change made by this campaign. The first line above is used as
the pull request title; everything below it becomes the pull request body.
"#
    )
}

fn repos_list() -> String {
    r#"# One repository per line, as org/repo or host/org/repo.
# Blank lines, comments and duplicates are ignored.
"#
    .to_string()
}
