//! # fleetrun
//!
//! Run the same shell command across a campaign of repository working copies
//! and keep track of where it worked.
//!
//! A campaign is a directory holding a repository list (`repos.txt`), a pull
//! request description (`README.md`) and a `work/` tree of checkouts laid
//! out as `work/<org>/<repo>`. Every `foreach` run writes a fresh result set
//! splitting the repositories into `successful` and `failed` lists with one
//! log per repository, and moves the `.latest_results` pointer to it so the
//! next run can target just the failures (or just the successes).
//!
//! ## Quick Example
//!
//! ```
//! use fleetrun::campaign::{parse_repo_list, Repository};
//!
//! let repos = parse_repo_list("# targets\norg/a\nghe.example.com/org/b\norg/a\n").unwrap();
//! assert_eq!(repos.len(), 2);
//! assert_eq!(repos[1].host.as_deref(), Some("ghe.example.com"));
//! assert_eq!(repos[0], Repository::parse("org/a").unwrap());
//! ```
//!
//! ## Modules
//!
//! - **`campaign`**: parsing the repository list and PR description.
//! - **`executor`**: running one command in one working copy, streaming its
//!   output.
//! - **`results`**: result sets on disk and the latest-results pointer.
//! - **`runner`**: the `foreach` loop, repository selection and run summaries.
//! - **`git`**: cloning and committing across a campaign.
//! - **`settings`**: the optional `.fleetrun.yaml` file.
//! - **`output`**: marker style for user-facing status lines.

pub mod campaign;
pub mod error;
pub mod executor;
pub mod git;
pub mod output;
pub mod results;
pub mod runner;
pub mod settings;
