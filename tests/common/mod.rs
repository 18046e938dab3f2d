//! Shared test utilities for E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_repos(&["org/a", "org/b"])
//!         .with_working_copy("org/a");
//!     fixture.command().args(["foreach", "--", "true"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::TestFixture;
}

/// A campaign directory in a temporary location.
///
/// The PR description is always present. Result sets are kept inside the
/// fixture so nothing leaks into the system temp directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a campaign with an empty repository list.
    pub fn new() -> Self {
        let fixture = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        fixture
            .with_file("README.md", "# Test campaign\n\nBody text.\n")
            .with_file("repos.txt", "")
    }

    /// Write the campaign repository list.
    pub fn with_repos(self, repos: &[&str]) -> Self {
        let mut content = repos.join("\n");
        content.push('\n');
        self.with_file("repos.txt", &content)
    }

    /// Create the working copy directory for `repo` (`org/name`).
    pub fn with_working_copy(self, repo: &str) -> Self {
        self.temp_dir
            .child("work")
            .child(repo)
            .create_dir_all()
            .expect("Failed to create working copy");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the campaign directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Where result sets are created.
    pub fn results_dir(&self) -> PathBuf {
        self.temp_dir.path().join("results")
    }

    /// The result set the latest-results pointer refers to.
    #[allow(dead_code)]
    pub fn latest_results(&self) -> PathBuf {
        let pointer = self.temp_dir.path().join(".latest_results");
        match fs::read_link(&pointer) {
            Ok(target) => target,
            Err(_) => PathBuf::from(
                fs::read_to_string(&pointer)
                    .expect("Failed to read pointer")
                    .trim(),
            ),
        }
    }

    /// Lines of a list file in the latest result set, without comments.
    #[allow(dead_code)]
    pub fn latest_list(&self, bucket: &str) -> Vec<String> {
        let content = fs::read_to_string(self.latest_results().join(bucket).join("repos.txt"))
            .expect("Failed to read list file");
        content
            .lines()
            .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command running in this campaign directory with results
    /// kept inside the fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("fleetrun");
        cmd.current_dir(self.path())
            .env("FLEETRUN_RESULTS_DIR", self.results_dir())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_has_campaign_files() {
        let fixture = TestFixture::new();
        assert!(fixture.path().join("README.md").exists());
        assert!(fixture.path().join("repos.txt").exists());
    }

    #[test]
    fn test_fixture_with_working_copy() {
        let fixture = TestFixture::new().with_working_copy("org/a");
        assert!(fixture.path().join("work/org/a").is_dir());
    }
}
