//! # Git Operations
//!
//! Cloning working copies and committing changes across a campaign. All git
//! work is done by the system `git` binary through a [`CommandExecutor`], so
//! whatever authentication the user has configured (SSH keys, credential
//! helpers, tokens in `~/.gitconfig`) applies unchanged.
//!
//! Both campaign-wide operations walk the repositories sequentially, count
//! each one as done, skipped or errored, and keep going after a failure.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::campaign::{Campaign, Repository};
use crate::error::{Error, Result};
use crate::executor::CommandExecutor;
use crate::results::Outcome;
use crate::runner::RunSummary;

/// Git actions needed by `clone` and `commit`. Allows substituting a fake in
/// tests.
pub trait GitOperations {
    /// Clone `url` into `<parent_dir>/<name>`.
    fn clone_into(
        &self,
        output: &mut dyn Write,
        parent_dir: &Path,
        url: &str,
        name: &str,
    ) -> Result<()>;

    /// Create and switch to `branch` in `working_dir`.
    fn checkout_new_branch(
        &self,
        output: &mut dyn Write,
        working_dir: &Path,
        branch: &str,
    ) -> Result<()>;

    /// Commit every tracked change in `working_dir`.
    fn commit_all(&self, output: &mut dyn Write, working_dir: &Path, message: &str) -> Result<()>;

    /// Whether `working_dir` has any staged, unstaged or untracked change.
    fn is_changed(&self, output: &mut dyn Write, working_dir: &Path) -> Result<bool>;
}

/// `GitOperations` backed by the `git` command line.
pub struct CommandGit<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> CommandGit<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    fn git(&self, output: &mut dyn Write, dir: &Path, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.executor.execute(output, dir, "git", &args)
    }
}

impl GitOperations for CommandGit<'_> {
    fn clone_into(
        &self,
        output: &mut dyn Write,
        parent_dir: &Path,
        url: &str,
        name: &str,
    ) -> Result<()> {
        self.git(output, parent_dir, &["clone", "--", url, name])
    }

    fn checkout_new_branch(
        &self,
        output: &mut dyn Write,
        working_dir: &Path,
        branch: &str,
    ) -> Result<()> {
        validate_branch_name(branch)?;
        self.git(output, working_dir, &["checkout", "-b", branch])
    }

    fn commit_all(&self, output: &mut dyn Write, working_dir: &Path, message: &str) -> Result<()> {
        self.git(output, working_dir, &["commit", "--all", "--message", message])
    }

    fn is_changed(&self, output: &mut dyn Write, working_dir: &Path) -> Result<bool> {
        let args = vec!["status".to_string(), "--porcelain".to_string()];
        let status = self
            .executor
            .execute_and_capture(output, working_dir, "git", &args)?;
        Ok(status.lines().any(|line| !line.trim().is_empty()))
    }
}

/// Reject branch names git would read as an option.
fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') {
        return Err(Error::Usage {
            message: format!("invalid branch name '{}'", name),
        });
    }
    Ok(())
}

/// HTTPS clone URL for `repo`, using `default_host` when the entry does not
/// name one.
pub fn clone_url(repo: &Repository, default_host: &str) -> String {
    let host = repo.host.as_deref().unwrap_or(default_host);
    format!("https://{}/{}/{}.git", host, repo.org, repo.name)
}

/// Clone every repository of `campaign` into `work_root` and create the
/// campaign branch in each fresh working copy. Existing working copies are
/// skipped.
pub fn clone_campaign(
    git: &dyn GitOperations,
    campaign: &Campaign,
    work_root: &Path,
    default_host: &str,
    output: &mut dyn Write,
) -> RunSummary {
    campaign
        .repos
        .iter()
        .fold(RunSummary::default(), |summary, repo| {
            let outcome = clone_one(git, campaign, repo, work_root, default_host, output);
            summary.add(outcome)
        })
}

fn clone_one(
    git: &dyn GitOperations,
    campaign: &Campaign,
    repo: &Repository,
    work_root: &Path,
    default_host: &str,
    output: &mut dyn Write,
) -> Outcome {
    let org_dir = work_root.join(&repo.org);
    let work_dir = repo.work_dir(work_root);

    if work_dir.exists() {
        let _ = writeln!(
            output,
            "Skipping {}: {} already exists",
            repo,
            work_dir.display()
        );
        return Outcome::Skipped;
    }

    let _ = writeln!(output, "== Cloning {} into {} =>", repo, work_dir.display());
    if let Err(e) = fs::create_dir_all(&org_dir) {
        let _ = writeln!(output, "Unable to create {}: {}", org_dir.display(), e);
        return Outcome::Failed;
    }

    let url = clone_url(repo, default_host);
    let result = git
        .clone_into(output, &org_dir, &url, &repo.name)
        .and_then(|()| git.checkout_new_branch(output, &work_dir, &campaign.name));

    match result {
        Ok(()) => Outcome::Succeeded,
        Err(e) => {
            let _ = writeln!(output, "Error when cloning {}: {}", repo, e);
            Outcome::Failed
        }
    }
}

/// Commit pending changes in every present working copy. Working copies that
/// are missing or unchanged are skipped.
pub fn commit_campaign(
    git: &dyn GitOperations,
    campaign: &Campaign,
    work_root: &Path,
    message: &str,
    output: &mut dyn Write,
) -> RunSummary {
    campaign
        .repos
        .iter()
        .fold(RunSummary::default(), |summary, repo| {
            summary.add(commit_one(git, repo, work_root, message, output))
        })
}

fn commit_one(
    git: &dyn GitOperations,
    repo: &Repository,
    work_root: &Path,
    message: &str,
    output: &mut dyn Write,
) -> Outcome {
    let work_dir = repo.work_dir(work_root);
    if !work_dir.exists() {
        let _ = writeln!(
            output,
            "Not committing in {} as the directory {} does not exist - has it been cloned?",
            repo,
            work_dir.display()
        );
        return Outcome::Skipped;
    }

    let _ = writeln!(output, "== {} =>", repo);
    match git.is_changed(output, &work_dir) {
        Ok(false) => {
            let _ = writeln!(output, "No changes in {} - skipping commit", repo);
            return Outcome::Skipped;
        }
        Ok(true) => {}
        Err(e) => {
            let _ = writeln!(output, "Error when checking for changes in {}: {}", repo, e);
            return Outcome::Failed;
        }
    }

    let _ = writeln!(output, "Committing changes in {}", repo);
    match git.commit_all(output, &work_dir, message) {
        Ok(()) => Outcome::Succeeded,
        Err(e) => {
            let _ = writeln!(output, "Error when committing changes in {}: {}", repo, e);
            Outcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::parse_repo_list;
    use crate::executor::fake::FakeExecutor;
    use tempfile::TempDir;

    fn campaign(names: &[&str]) -> Campaign {
        Campaign {
            name: "bump-deps".to_string(),
            repos: parse_repo_list(&names.join("\n")).unwrap(),
            pr_title: "Bump deps".to_string(),
            pr_body: String::new(),
        }
    }

    #[test]
    fn test_validate_branch_name_rejects_dash_prefix() {
        assert!(validate_branch_name("-evil").is_err());
        assert!(validate_branch_name("--upload-pack").is_err());
        assert!(validate_branch_name("").is_err());
    }

    #[test]
    fn test_validate_branch_name_accepts_normal() {
        assert!(validate_branch_name("main").is_ok());
        assert!(validate_branch_name("feature/my-branch").is_ok());
    }

    #[test]
    fn test_clone_url_uses_entry_host() {
        let repo = Repository::parse("git.example.com/org/repo").unwrap();
        assert_eq!(clone_url(&repo, "github.com"), "https://git.example.com/org/repo.git");
    }

    #[test]
    fn test_clone_url_falls_back_to_default_host() {
        let repo = Repository::parse("org/repo").unwrap();
        assert_eq!(clone_url(&repo, "github.com"), "https://github.com/org/repo.git");
    }

    #[test]
    fn test_clone_campaign_clones_and_branches() {
        let temp_dir = TempDir::new().unwrap();
        let work = temp_dir.path().join("work");
        let executor = FakeExecutor::always_succeeds();
        let git = CommandGit::new(&executor);

        let summary = clone_campaign(
            &git,
            &campaign(&["org/a"]),
            &work,
            "github.com",
            &mut Vec::<u8>::new(),
        );

        assert_eq!(summary.done, 1);
        let calls = executor.calls();
        assert_eq!(
            &calls[0][1..],
            ["git", "clone", "--", "https://github.com/org/a.git", "a"]
        );
        assert!(Path::new(&calls[0][0]).ends_with("work/org"));
        assert_eq!(&calls[1][1..], ["git", "checkout", "-b", "bump-deps"]);
        assert!(Path::new(&calls[1][0]).ends_with("work/org/a"));
    }

    #[test]
    fn test_clone_campaign_skips_existing_working_copy() {
        let temp_dir = TempDir::new().unwrap();
        let work = temp_dir.path().join("work");
        fs::create_dir_all(work.join("org/a")).unwrap();
        let executor = FakeExecutor::always_succeeds();
        let git = CommandGit::new(&executor);

        let summary = clone_campaign(
            &git,
            &campaign(&["org/a", "org/b"]),
            &work,
            "github.com",
            &mut Vec::<u8>::new(),
        );

        assert_eq!(
            summary,
            RunSummary {
                done: 1,
                skipped: 1,
                errored: 0
            }
        );
        assert!(executor.calls().iter().all(|c| !c.contains(&"a".to_string())));
    }

    #[test]
    fn test_clone_campaign_continues_after_failure() {
        let temp_dir = TempDir::new().unwrap();
        let executor = FakeExecutor::always_fails();
        let git = CommandGit::new(&executor);

        let summary = clone_campaign(
            &git,
            &campaign(&["org/a", "org/b"]),
            &temp_dir.path().join("work"),
            "github.com",
            &mut Vec::<u8>::new(),
        );

        assert_eq!(summary.errored, 2);
        // No checkout attempted after a failed clone.
        assert_eq!(executor.calls().len(), 2);
    }

    #[test]
    fn test_commit_campaign_only_commits_changed_copies() {
        let temp_dir = TempDir::new().unwrap();
        let work = temp_dir.path().join("work");
        fs::create_dir_all(work.join("org/changed")).unwrap();
        fs::create_dir_all(work.join("org/clean")).unwrap();

        let executor = FakeExecutor::with_handler(|dir, _, args| {
            if args.first().map(String::as_str) == Some("status") && dir.ends_with("changed") {
                Ok(" M src/lib.rs\n".to_string())
            } else {
                Ok(String::new())
            }
        });
        let git = CommandGit::new(&executor);
        let mut output = Vec::new();

        let summary = commit_campaign(
            &git,
            &campaign(&["org/changed", "org/clean", "org/missing"]),
            &work,
            "Bump dependencies",
            &mut output,
        );

        assert_eq!(
            summary,
            RunSummary {
                done: 1,
                skipped: 2,
                errored: 0
            }
        );
        let commits: Vec<_> = executor
            .calls()
            .into_iter()
            .filter(|c| c.get(2).map(String::as_str) == Some("commit"))
            .collect();
        assert_eq!(commits.len(), 1);
        assert_eq!(
            &commits[0][2..],
            ["commit", "--all", "--message", "Bump dependencies"]
        );
        assert!(String::from_utf8(output)
            .unwrap()
            .contains("No changes in org/clean"));
    }

    #[test]
    fn test_commit_campaign_counts_status_failure() {
        let temp_dir = TempDir::new().unwrap();
        let work = temp_dir.path().join("work");
        fs::create_dir_all(work.join("org/a")).unwrap();
        let executor = FakeExecutor::always_fails();
        let git = CommandGit::new(&executor);

        let summary = commit_campaign(
            &git,
            &campaign(&["org/a"]),
            &work,
            "msg",
            &mut Vec::<u8>::new(),
        );

        assert_eq!(summary.errored, 1);
        assert_eq!(executor.calls().len(), 1);
    }
}
