//! # Campaign Settings
//!
//! A campaign directory may carry a `.fleetrun.yaml` file that overrides where
//! the campaign files, working copies and result sets live. Every key is
//! optional; an absent file means all defaults.
//!
//! ```yaml
//! repos_file: repos.txt
//! description_file: README.md
//! work_dir: work
//! latest_results: .latest_results
//! clone_host: github.com
//! # results_dir: /var/tmp/fleetrun
//! ```
//!
//! Relative paths are resolved against the campaign directory by
//! [`Settings::resolve`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// File name of the settings file inside a campaign directory.
pub const SETTINGS_FILE: &str = ".fleetrun.yaml";

/// Per-campaign settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default repository list.
    pub repos_file: PathBuf,
    /// Pull request title and body.
    pub description_file: PathBuf,
    /// Root of the `<org>/<repo>` working copies.
    pub work_dir: PathBuf,
    /// Parent directory for new result sets. `None` means the system temp dir.
    pub results_dir: Option<PathBuf>,
    /// Pointer to the most recent result set.
    pub latest_results: PathBuf,
    /// Host used to clone `org/repo` entries that do not name one.
    pub clone_host: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repos_file: PathBuf::from("repos.txt"),
            description_file: PathBuf::from("README.md"),
            work_dir: PathBuf::from("work"),
            results_dir: None,
            latest_results: PathBuf::from(".latest_results"),
            clone_host: "github.com".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `campaign_dir`, falling back to defaults when the
    /// campaign has no settings file.
    pub fn load(campaign_dir: &Path) -> Result<Self> {
        let path = campaign_dir.join(SETTINGS_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No {} in {}, using defaults", SETTINGS_FILE, campaign_dir.display());
                return Ok(Self::default().resolve(campaign_dir));
            }
            Err(source) => return Err(Error::CannotOpen { path, source }),
        };

        let settings = Self::parse(&content).map_err(|source| Error::Settings {
            path: path.clone(),
            source,
        })?;
        Ok(settings.resolve(campaign_dir))
    }

    /// Parse settings YAML. A document with no keys yields the defaults.
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let has_keys = content.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !has_keys {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Make every relative path absolute with respect to `campaign_dir`.
    pub fn resolve(mut self, campaign_dir: &Path) -> Self {
        let anchor = |p: PathBuf| {
            if p.is_absolute() {
                p
            } else {
                campaign_dir.join(p)
            }
        };
        self.repos_file = anchor(self.repos_file);
        self.description_file = anchor(self.description_file);
        self.work_dir = anchor(self.work_dir);
        self.latest_results = anchor(self.latest_results);
        self.results_dir = self.results_dir.map(anchor);
        self
    }

    /// Default settings rendered as a commented file, used by `init`.
    pub fn template() -> &'static str {
        r#"# fleetrun campaign settings
# Every key is optional; the values below are the defaults.

repos_file: repos.txt
description_file: README.md
work_dir: work
latest_results: .latest_results
clone_host: github.com

# Where result sets are created (defaults to the system temp directory)
# results_dir: /var/tmp/fleetrun
"#
    }
}
