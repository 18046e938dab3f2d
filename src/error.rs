//! # Error Handling
//!
//! This module defines the centralized error type for `fleetrun`. It uses the
//! `thiserror` library to describe every failure mode the library can report,
//! grouped by how the caller is expected to react:
//!
//! - **Usage errors** (`Usage`): conflicting command-line selections. Fatal,
//!   raised before any file is read.
//! - **Load errors** (`CannotOpen`, `RepoListParse`, `Settings`,
//!   `NoPreviousResults`): the campaign cannot be assembled. Fatal, raised
//!   before any repository is touched.
//! - **Execution failures** (`Spawn`, `CommandFailed`): an external command
//!   could not be started or exited non-zero. The runner classifies these as
//!   failed repositories and moves on.
//! - **Recorder errors** (`Recorder`): a result-set file could not be written.
//!   Fatal while the result set is being created, a warning afterwards.
//!
//! The `Result<T>` alias is used throughout the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for fleetrun operations
#[derive(Error, Debug)]
pub enum Error {
    /// Mutually exclusive options were combined.
    #[error("Usage error: {message}")]
    Usage { message: String },

    /// A campaign file is missing or unreadable.
    #[error("Unable to open {}: {source}", path.display())]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A repository list line is not `org/repo` or `host/org/repo`.
    #[error("Unable to parse entry on line {line_number} of {}: {line}", path.display())]
    RepoListParse {
        path: PathBuf,
        line_number: usize,
        line: String,
    },

    /// The campaign settings file is not valid YAML for `Settings`.
    #[error("Invalid settings file {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A previous-run selection was requested but no run has been recorded.
    #[error("No previous results found at {} - run foreach without --successful/--failed first", pointer.display())]
    NoPreviousResults { pointer: PathBuf },

    /// The external command could not be started.
    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external command ran and exited unsuccessfully.
    #[error("{command} failed with {status}{}", if stderr.is_empty() { String::new() } else { format!(": {}", stderr.trim_end()) })]
    CommandFailed {
        command: String,
        status: String,
        /// Standard error, when it was captured rather than streamed
        stderr: String,
    },

    /// A result-set file or directory could not be written.
    #[error("Unable to write {}: {source}", path.display())]
    Recorder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn recorder(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Recorder {
            path: path.into(),
            source,
        }
    }
}
