//! # CLI Command Implementations
//!
//! One module per `fleetrun` subcommand. Each module defines an `Args`
//! struct derived with `clap` and an `execute` function that drives the
//! `fleetrun` library.
//!
//! Every command except `init` runs from inside a campaign directory and
//! reads its optional `.fleetrun.yaml` through [`load_campaign_settings`].

pub mod clone;
pub mod commit;
pub mod foreach;
pub mod init;

use anyhow::{Context, Result};

use fleetrun::settings::Settings;

/// Settings of the campaign in the current directory, paths resolved.
pub(crate) fn load_campaign_settings() -> Result<Settings> {
    let campaign_dir =
        std::env::current_dir().context("Unable to determine the current directory")?;
    let settings = Settings::load(&campaign_dir)?;
    log::debug!("Using settings {:?}", settings);
    Ok(settings)
}
