//! # Result Sets
//!
//! Every `foreach` run leaves behind a result set: a directory that records
//! which repositories succeeded, which failed, and what each one printed.
//!
//! ```text
//! fleetrun-foreach-<campaign>-XXXXXX/
//! ├── successful/
//! │   ├── repos.txt              # header comment + one repo per line
//! │   └── <org>/<repo>/logs.txt
//! └── failed/
//!     ├── repos.txt
//!     └── <org>/<repo>/logs.txt
//! ```
//!
//! The `repos.txt` files use the campaign repository-list format, so a later
//! run can load either of them directly as its target list. A well-known
//! pointer (a symlink on Unix, a small file holding the path elsewhere) is
//! moved to the newest result set once per run, before any repository is
//! processed. A run that dies part-way therefore leaves the pointer on a
//! complete directory skeleton whose lists may be partially filled.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::campaign::Repository;
use crate::error::{Error, Result};

/// Name of the per-outcome repository list inside each bucket.
pub const LIST_FILE: &str = "repos.txt";

/// Name of the captured output file inside each repository directory.
pub const LOG_FILE: &str = "logs.txt";

/// Terminal state of one repository in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The working copy was absent; the command never ran.
    Skipped,
    Succeeded,
    Failed,
}

impl Outcome {
    /// The result-set subdirectory this outcome is recorded under.
    pub fn bucket(self) -> Option<&'static str> {
        match self {
            Outcome::Skipped => None,
            Outcome::Succeeded => Some("successful"),
            Outcome::Failed => Some("failed"),
        }
    }
}

/// What happened to one repository, and what it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub repo: Repository,
    pub outcome: Outcome,
    /// Captured output; always empty for `Skipped`.
    pub log: String,
}

impl ExecutionOutcome {
    pub fn skipped(repo: Repository) -> Self {
        Self {
            repo,
            outcome: Outcome::Skipped,
            log: String::new(),
        }
    }

    pub fn succeeded(repo: Repository, log: String) -> Self {
        Self {
            repo,
            outcome: Outcome::Succeeded,
            log,
        }
    }

    pub fn failed(repo: Repository, log: String) -> Self {
        Self {
            repo,
            outcome: Outcome::Failed,
            log,
        }
    }
}

/// Persists execution outcomes.
///
/// Recording never fails the caller: implementations report their own I/O
/// problems as warnings.
pub trait OutcomeRecorder {
    fn record(&mut self, outcome: &ExecutionOutcome);
}

/// An on-disk result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    root: PathBuf,
}

impl ResultSet {
    /// Create a fresh, uniquely named result set under `parent`.
    ///
    /// Both list files are seeded with a comment naming `command` so the
    /// lists stay self-describing when reused as input.
    pub fn create(parent: &Path, campaign_name: &str, command: &str) -> Result<Self> {
        fs::create_dir_all(parent).map_err(|e| Error::recorder(parent, e))?;

        let prefix = format!("fleetrun-foreach-{}-", sanitize(campaign_name));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(parent)
            .map_err(|e| Error::recorder(parent, e))?;
        let root = fs::canonicalize(dir.keep()).map_err(|e| Error::recorder(parent, e))?;

        let result_set = Self { root };
        for (outcome, description) in [
            (Outcome::Succeeded, "were successfully processed"),
            (Outcome::Failed, "failed to be processed"),
        ] {
            let list = result_set.list_path(outcome);
            if let Some(bucket) = list.parent() {
                fs::create_dir_all(bucket).map_err(|e| Error::recorder(bucket, e))?;
            }
            let header = format!(
                "# This file contains the list of repositories that {} by fleetrun foreach\n# for the command: {}\n",
                description, command
            );
            fs::write(&list, header).map_err(|e| Error::recorder(&list, e))?;
        }

        log::debug!("Created result set {}", result_set.root.display());
        Ok(result_set)
    }

    /// Open an existing result set rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `repos.txt` for `outcome`. `Skipped` has no list and maps to the
    /// root itself.
    pub fn list_path(&self, outcome: Outcome) -> PathBuf {
        match outcome.bucket() {
            Some(bucket) => self.root.join(bucket).join(LIST_FILE),
            None => self.root.clone(),
        }
    }

    /// Where the captured output for `repo` is written.
    pub fn log_path(&self, outcome: Outcome, repo: &Repository) -> Option<PathBuf> {
        outcome
            .bucket()
            .map(|bucket| repo.work_dir(&self.root.join(bucket)).join(LOG_FILE))
    }

    /// Point `pointer` at this result set, replacing any previous target.
    ///
    /// The new pointer is built beside the old one and renamed over it, so
    /// readers see either the old or the new target, never a partial one.
    pub fn update_pointer(&self, pointer: &Path) -> Result<()> {
        let file_name = pointer
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "latest_results".to_string());
        let staging = pointer.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

        match fs::remove_file(&staging) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::recorder(&staging, e)),
        }

        write_pointer(&staging, &self.root).map_err(|e| Error::recorder(&staging, e))?;
        fs::rename(&staging, pointer).map_err(|e| {
            let _ = fs::remove_file(&staging);
            Error::recorder(pointer, e)
        })?;

        log::debug!("{} -> {}", pointer.display(), self.root.display());
        Ok(())
    }

    /// Follow `pointer` to the result set it names.
    pub fn resolve_pointer(pointer: &Path) -> Result<Self> {
        let missing = || Error::NoPreviousResults {
            pointer: pointer.to_path_buf(),
        };

        let metadata = match fs::symlink_metadata(pointer) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
            Err(e) => return Err(Error::Io(e)),
        };

        let target = if metadata.file_type().is_symlink() {
            fs::read_link(pointer)?
        } else {
            PathBuf::from(fs::read_to_string(pointer)?.trim_end())
        };
        let target = match pointer.parent() {
            Some(parent) if target.is_relative() => parent.join(target),
            _ => target,
        };

        if !target.is_dir() {
            return Err(missing());
        }
        Ok(Self::open(target))
    }

    fn try_record(&self, outcome: &ExecutionOutcome) -> Result<()> {
        let Some(log_path) = self.log_path(outcome.outcome, &outcome.repo) else {
            return Ok(());
        };

        let list = self.list_path(outcome.outcome);
        let appended = OpenOptions::new()
            .append(true)
            .open(&list)
            .and_then(|mut file| writeln!(file, "{}", outcome.repo.full_name))
            .map_err(|e| Error::recorder(&list, e));

        let logged = log_path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&log_path, &outcome.log))
            .map_err(|e| Error::recorder(&log_path, e));

        appended.and(logged)
    }
}

impl OutcomeRecorder for ResultSet {
    fn record(&mut self, outcome: &ExecutionOutcome) {
        if let Err(e) = self.try_record(outcome) {
            log::warn!("Failed to record result for {}: {}", outcome.repo, e);
        }
    }
}

#[cfg(unix)]
fn write_pointer(staging: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, staging)
}

#[cfg(not(unix))]
fn write_pointer(staging: &Path, target: &Path) -> std::io::Result<()> {
    let mut file = fs::File::create(staging)?;
    writeln!(file, "{}", target.display())?;
    file.sync_all()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
