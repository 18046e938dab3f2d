//! # Foreach Runner
//!
//! Runs one command in every selected working copy of a campaign, strictly one
//! repository at a time and in campaign order, and hands each outcome to an
//! [`OutcomeRecorder`].
//!
//! ## Selection
//!
//! A run targets exactly one of:
//! - every repository in the campaign list (or a custom list file),
//! - the repositories that succeeded in the previous run,
//! - the repositories that failed in the previous run.
//!
//! The previous-run modes read the `repos.txt` of the result set the
//! `.latest_results` pointer names.
//!
//! ## Per-repository cycle
//!
//! 1. No working copy on disk: `Skipped`, the executor is not called.
//! 2. Otherwise run the command; `Ok` is `Succeeded`, any error is `Failed`.
//! 3. Record the outcome.
//! 4. Count it.
//!
//! Nothing that happens inside one repository's cycle stops the run.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::campaign::{Campaign, Repository};
use crate::error::{Error, Result};
use crate::executor::{format_command, CommandExecutor};
use crate::output::{OutputConfig, Tone};
use crate::results::{ExecutionOutcome, Outcome, OutcomeRecorder, ResultSet};
use crate::settings::Settings;

/// Which repositories a run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The campaign list, or `repos_file` when given.
    All { repos_file: Option<PathBuf> },
    PreviouslySuccessful,
    PreviouslyFailed,
}

impl Selection {
    /// Build a selection from the three mutually exclusive options.
    pub fn from_flags(repos_file: Option<PathBuf>, successful: bool, failed: bool) -> Result<Self> {
        let chosen =
            usize::from(repos_file.is_some()) + usize::from(successful) + usize::from(failed);
        if chosen > 1 {
            return Err(Error::Usage {
                message: "only one of --repos, --successful and --failed may be used".to_string(),
            });
        }

        Ok(if successful {
            Selection::PreviouslySuccessful
        } else if failed {
            Selection::PreviouslyFailed
        } else {
            Selection::All { repos_file }
        })
    }

    /// The repository list file this selection reads.
    ///
    /// Previous-run selections announce the substitution on `output`.
    pub fn resolve_repo_list(
        &self,
        default_list: &Path,
        pointer: &Path,
        output: &mut dyn Write,
    ) -> Result<PathBuf> {
        let (outcome, label) = match self {
            Selection::All { repos_file } => {
                return Ok(repos_file.clone().unwrap_or_else(|| default_list.to_path_buf()))
            }
            Selection::PreviouslySuccessful => (Outcome::Succeeded, "successful"),
            Selection::PreviouslyFailed => (Outcome::Failed, "failed"),
        };

        let previous = ResultSet::resolve_pointer(pointer)?;
        let list = previous.list_path(outcome);
        writeln!(
            output,
            "Using the {} repositories from the previous run: {}",
            label,
            list.display()
        )?;
        Ok(list)
    }
}

/// Counters for one pass over a campaign.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub done: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl RunSummary {
    /// Count one terminal outcome.
    pub fn add(mut self, outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => self.done += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.errored += 1,
        }
        self
    }

    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }

    pub fn tone(&self) -> Tone {
        if self.has_errors() {
            Tone::Warning
        } else {
            Tone::Success
        }
    }

    /// One line reporting all three counters, e.g.
    /// `✅ fleetrun foreach completed (2 OK, 0 skipped, 0 errored)`.
    pub fn summary_line(&self, activity: &str, config: &OutputConfig) -> String {
        let wording = if self.has_errors() {
            "completed with errors"
        } else {
            "completed"
        };
        format!(
            "{} fleetrun {} {} ({} OK, {} skipped, {} errored)",
            config.marker(self.tone()),
            activity,
            wording,
            self.done,
            self.skipped,
            self.errored
        )
    }
}

/// Runs a command across working copies.
pub struct ForeachRunner<'a> {
    executor: &'a dyn CommandExecutor,
    recorder: &'a mut dyn OutcomeRecorder,
    work_root: PathBuf,
}

impl<'a> ForeachRunner<'a> {
    pub fn new(
        executor: &'a dyn CommandExecutor,
        recorder: &'a mut dyn OutcomeRecorder,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            recorder,
            work_root: work_root.into(),
        }
    }

    /// Run `command` in each repository's working copy, in order.
    ///
    /// Each repository is fully executed and recorded before the next one
    /// starts.
    pub fn run(
        &mut self,
        repos: Vec<Repository>,
        command: &str,
        args: &[String],
        output: &mut dyn Write,
    ) -> RunSummary {
        repos.into_iter().fold(RunSummary::default(), |summary, repo| {
            let outcome = self.run_one(repo, command, args, output);
            self.recorder.record(&outcome);
            summary.add(outcome.outcome)
        })
    }

    fn run_one(
        &self,
        repo: Repository,
        command: &str,
        args: &[String],
        output: &mut dyn Write,
    ) -> ExecutionOutcome {
        let work_dir = repo.work_dir(&self.work_root);
        if !work_dir.exists() {
            let _ = writeln!(
                output,
                "Not running against {} as the directory {} does not exist - has it been cloned?",
                repo,
                work_dir.display()
            );
            log::debug!("Skipping {}", repo);
            return ExecutionOutcome::skipped(repo);
        }

        let _ = writeln!(output, "== {} =>", repo);
        let mut tee = Tee::new(output);
        match self.executor.execute(&mut tee, &work_dir, command, args) {
            Ok(()) => ExecutionOutcome::succeeded(repo, tee.into_log()),
            Err(e) => {
                let _ = writeln!(tee, "Error when executing command in {}: {}", repo, e);
                ExecutionOutcome::failed(repo, tee.into_log())
            }
        }
    }
}

/// The result of a full `foreach` invocation.
#[derive(Debug)]
pub struct ForeachReport {
    pub campaign: String,
    pub summary: RunSummary,
    pub result_set: ResultSet,
}

/// Run a complete `foreach`: pick the repository list, load the campaign,
/// open a new result set, move the pointer to it, then run every repository.
///
/// Loading errors abort before any repository is touched. Per-repository
/// failures only show up in the returned summary.
pub fn foreach(
    settings: &Settings,
    selection: &Selection,
    command: &str,
    args: &[String],
    executor: &dyn CommandExecutor,
    output: &mut dyn Write,
) -> Result<ForeachReport> {
    let repo_list =
        selection.resolve_repo_list(&settings.repos_file, &settings.latest_results, output)?;
    let campaign = Campaign::load(&repo_list, &settings.description_file)?;

    let command_line = format_command(command, args);
    let results_parent = settings
        .results_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let mut result_set = ResultSet::create(&results_parent, &campaign.name, &command_line)?;
    result_set.update_pointer(&settings.latest_results)?;

    writeln!(
        output,
        "Running {} against {} repositories",
        command_line,
        campaign.repos.len()
    )?;

    let summary = ForeachRunner::new(executor, &mut result_set, &settings.work_dir).run(
        campaign.repos,
        command,
        args,
        output,
    );

    Ok(ForeachReport {
        campaign: campaign.name,
        summary,
        result_set,
    })
}

/// Forwards everything to the display sink while keeping a copy for the
/// repository's log file.
struct Tee<'a> {
    display: &'a mut dyn Write,
    captured: Vec<u8>,
}

impl<'a> Tee<'a> {
    fn new(display: &'a mut dyn Write) -> Self {
        Self {
            display,
            captured: Vec::new(),
        }
    }

    fn into_log(self) -> String {
        String::from_utf8_lossy(&self.captured).into_owned()
    }
}

impl Write for Tee<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.captured.extend_from_slice(buf);
        // A broken display must not lose the log.
        let _ = self.display.write_all(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.display.flush();
        Ok(())
    }
}
