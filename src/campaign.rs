//! # Campaign Loading
//!
//! A campaign is a directory holding a repository list (`repos.txt`) and a
//! pull request description (`README.md`). This module turns those two files
//! into a [`Campaign`]: an ordered, de-duplicated list of [`Repository`]
//! entries plus the PR title and body.
//!
//! ## Repository list format
//!
//! ```text
//! # comments and blank lines are ignored
//! my-org/service-a
//! github.example.com/platform/service-b
//! my-org/service-a        <- duplicate, dropped
//! ```
//!
//! Two `/`-separated segments are `org/repo`, three are `host/org/repo`.
//! Anything else is a parse error naming the line.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One target repository as listed in the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    /// Forge host, when the entry names one.
    pub host: Option<String>,
    pub org: String,
    pub name: String,
    /// The entry exactly as identified in the list file.
    pub full_name: String,
}

impl Repository {
    /// Parse a single list entry. Returns `None` unless it has two or three
    /// segments, none of them empty, `.` or `..`.
    pub fn parse(entry: &str) -> Option<Self> {
        let segments: Vec<&str> = entry.split('/').collect();
        if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
            return None;
        }

        let (host, org, name) = match segments.as_slice() {
            [org, name] => (None, *org, *name),
            [host, org, name] => (Some(host.to_string()), *org, *name),
            _ => return None,
        };

        Some(Self {
            host,
            org: org.to_string(),
            name: name.to_string(),
            full_name: entry.to_string(),
        })
    }

    /// The working copy location, `<work_dir>/<org>/<name>`.
    pub fn work_dir(&self, work_root: &Path) -> PathBuf {
        work_root.join(&self.org).join(&self.name)
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// A named set of repositories and the pull request that will be raised
/// against each of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    pub name: String,
    pub repos: Vec<Repository>,
    pub pr_title: String,
    pub pr_body: String,
}

impl Campaign {
    /// Load a campaign from its repository list and PR description files.
    ///
    /// The campaign is named after the directory that contains the PR
    /// description. Either file failing to open or parse aborts the load.
    pub fn load(repo_list: &Path, pr_description: &Path) -> Result<Self> {
        let repos = load_repo_list(repo_list)?;

        let description = read_file(pr_description)?;
        let (pr_title, pr_body) = parse_pr_description(&description);

        let name = campaign_name(pr_description);
        log::debug!(
            "Loaded campaign '{}' with {} repositories from {}",
            name,
            repos.len(),
            repo_list.display()
        );

        Ok(Self {
            name,
            repos,
            pr_title,
            pr_body,
        })
    }
}

/// Read and parse a repository list file.
pub fn load_repo_list(path: &Path) -> Result<Vec<Repository>> {
    let content = read_file(path)?;
    parse_repo_list(&content).map_err(|(line_number, line)| Error::RepoListParse {
        path: path.to_path_buf(),
        line_number,
        line,
    })
}

/// Parse repository list text.
///
/// On failure returns the 1-based line number and the offending line
/// verbatim.
pub fn parse_repo_list(content: &str) -> std::result::Result<Vec<Repository>, (usize, String)> {
    let mut seen = HashSet::new();
    let mut repos = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let entry = raw.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }

        let repo = Repository::parse(entry).ok_or_else(|| (index + 1, raw.to_string()))?;
        if seen.insert(entry.to_string()) {
            repos.push(repo);
        }
    }

    Ok(repos)
}

/// Split a PR description into title and body.
///
/// The first non-blank line, minus leading `#` and whitespace, is the title.
/// Every line after it, joined with `\n`, is the body.
pub fn parse_pr_description(content: &str) -> (String, String) {
    let mut lines = content.lines().skip_while(|line| line.trim().is_empty());

    let title = lines
        .next()
        .map(|line| line.trim_start_matches(|c: char| c == '#' || c.is_whitespace()))
        .unwrap_or_default()
        .trim_end()
        .to_string();
    let body = lines.collect::<Vec<_>>().join("\n");

    (title, body)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::CannotOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn campaign_name(pr_description: &Path) -> String {
    let dir = pr_description
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    fs::canonicalize(dir)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "campaign".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn full_names(repos: &[Repository]) -> Vec<&str> {
        repos.iter().map(|r| r.full_name.as_str()).collect()
    }

    #[test]
    fn test_parse_two_segments() {
        let repo = Repository::parse("org/repo").unwrap();
        assert_eq!(repo.host, None);
        assert_eq!(repo.org, "org");
        assert_eq!(repo.name, "repo");
        assert_eq!(repo.full_name, "org/repo");
    }

    #[test]
    fn test_parse_three_segments() {
        let repo = Repository::parse("github.example.com/org/repo").unwrap();
        assert_eq!(repo.host.as_deref(), Some("github.example.com"));
        assert_eq!(repo.org, "org");
        assert_eq!(repo.name, "repo");
    }

    #[test]
    fn test_parse_rejects_other_segment_counts() {
        assert!(Repository::parse("repo").is_none());
        assert!(Repository::parse("a/b/c/d").is_none());
        assert!(Repository::parse("org/").is_none());
    }

    #[test]
    fn test_parse_rejects_relative_segments() {
        assert!(Repository::parse("org/..").is_none());
        assert!(Repository::parse("../x").is_none());
        assert!(Repository::parse("h/./x").is_none());
        assert!(Repository::parse("../..").is_none());
        assert!(Repository::parse("org/.hidden").is_some());
    }

    #[test]
    fn test_repo_list_relative_segment_names_line() {
        let err = parse_repo_list("org/a
# skip
../..
").unwrap_err();
        assert_eq!(err, (3, "../..".to_string()));
    }

    #[test]
    fn test_work_dir() {
        let repo = Repository::parse("host/org/repo").unwrap();
        assert_eq!(
            repo.work_dir(Path::new("work")),
            PathBuf::from("work").join("org").join("repo")
        );
    }

    #[test]
    fn test_repo_list_skips_comments_and_blanks() {
        let repos = parse_repo_list("# header\n\norg/a\n   \n#org/b\norg/c\n").unwrap();
        assert_eq!(full_names(&repos), vec!["org/a", "org/c"]);
    }

    #[test]
    fn test_repo_list_dedup_keeps_first_position() {
        let repos = parse_repo_list("org/a\norg/b\norg/a\n").unwrap();
        assert_eq!(full_names(&repos), vec!["org/a", "org/b"]);
    }

    #[test]
    fn test_repo_list_parse_error_names_line() {
        let err = parse_repo_list("org/a\nnot-a-repo\norg/b\n").unwrap_err();
        assert_eq!(err, (2, "not-a-repo".to_string()));
    }

    #[test]
    fn test_pr_description() {
        let (title, body) = parse_pr_description("\n# Upgrade the widget\nLine one\n\nLine three");
        assert_eq!(title, "Upgrade the widget");
        assert_eq!(body, "Line one\n\nLine three");
    }

    #[test]
    fn test_pr_description_without_heading_marker() {
        let (title, body) = parse_pr_description("Plain title\n");
        assert_eq!(title, "Plain title");
        assert_eq!(body, "");
    }

    #[test]
    fn test_pr_description_empty() {
        assert_eq!(parse_pr_description(""), (String::new(), String::new()));
    }

    #[test]
    fn test_load_campaign() {
        let temp_dir = TempDir::new().unwrap();
        let campaign_dir = temp_dir.path().join("bump-deps");
        fs::create_dir(&campaign_dir).unwrap();
        fs::write(campaign_dir.join("repos.txt"), "org/a\norg/b\n").unwrap();
        fs::write(campaign_dir.join("README.md"), "# Bump deps\nBody").unwrap();

        let campaign = Campaign::load(
            &campaign_dir.join("repos.txt"),
            &campaign_dir.join("README.md"),
        )
        .unwrap();

        assert_eq!(campaign.name, "bump-deps");
        assert_eq!(full_names(&campaign.repos), vec!["org/a", "org/b"]);
        assert_eq!(campaign.pr_title, "Bump deps");
        assert_eq!(campaign.pr_body, "Body");
    }

    #[test]
    fn test_load_missing_repo_list_is_cannot_open() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Title").unwrap();

        let err = Campaign::load(
            &temp_dir.path().join("repos.txt"),
            &temp_dir.path().join("README.md"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::CannotOpen { ref path, .. } if path.ends_with("repos.txt")));
    }

    #[test]
    fn test_load_missing_description_is_cannot_open() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("repos.txt"), "org/a").unwrap();

        let err = Campaign::load(
            &temp_dir.path().join("repos.txt"),
            &temp_dir.path().join("README.md"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::CannotOpen { ref path, .. } if path.ends_with("README.md")));
    }

    #[test]
    fn test_load_parse_error_carries_line() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("repos.txt"), "org/a\na/b/c/d\n").unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Title").unwrap();

        let err = Campaign::load(
            &temp_dir.path().join("repos.txt"),
            &temp_dir.path().join("README.md"),
        )
        .unwrap_err();
        match err {
            Error::RepoListParse {
                line_number, line, ..
            } => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "a/b/c/d");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn entry() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,3}/[a-z]{1,3}",
            "[a-z]{1,3}\\.com/[a-z]{1,3}/[a-z]{1,3}",
            Just("# comment".to_string()),
            Just(String::new()),
        ]
    }

    fn entries() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(entry(), 0..20)
    }

    proptest! {
        #[test]
        fn prop_reparse_is_idempotent(lines in entries()) {
            let text = lines.join("\n");
            prop_assert_eq!(parse_repo_list(&text), parse_repo_list(&text));
        }

        #[test]
        fn prop_entries_are_unique_in_first_seen_order(lines in entries()) {
            let text = lines.join("\n");
            let repos = parse_repo_list(&text).unwrap();

            let mut expected: Vec<&str> = Vec::new();
            for line in &lines {
                if !line.is_empty()
                    && !line.starts_with('#')
                    && !expected.contains(&line.as_str())
                {
                    expected.push(line.as_str());
                }
            }
            prop_assert_eq!(full_names(&repos), expected);
        }

        #[test]
        fn prop_written_list_reparses_to_same_repos(lines in entries()) {
            let repos = parse_repo_list(&lines.join("\n")).unwrap();
            let rewritten = full_names(&repos).join("\n");
            prop_assert_eq!(parse_repo_list(&rewritten).unwrap(), repos);
        }
    }
}
