//! # Command Execution
//!
//! Every interaction with the outside world (running the user's command,
//! cloning, committing) goes through the [`CommandExecutor`] trait: "run this
//! program with these arguments in this directory and tell me whether it
//! succeeded."
//!
//! [`ProcessExecutor`] is the real implementation. It never goes through a
//! shell, so repository names and arguments cannot be reinterpreted. While
//! the child runs, its stdout and stderr are each drained by their own reader
//! thread so neither pipe can fill up and stall the child; lines are handed
//! back over a channel and written to the caller's sink in arrival order.
//! The call returns only once the child has exited.
//!
//! The trait exists so the runner and the git helpers can be exercised with a
//! fake executor in tests.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use crate::error::{Error, Result};

/// Arguments longer than this are shown as `...` in the `Executing:` line.
const MAX_DISPLAYED_ARG_LEN: usize = 30;

/// Prefix for every forwarded line of child output.
const CHILD_OUTPUT_INDENT: &str = "    ";

/// Runs external commands inside a working directory.
pub trait CommandExecutor {
    /// Run `command` with `args` in `working_dir`, streaming its combined
    /// output to `output`.
    ///
    /// Returns `Error::Spawn` if the process could not be started and
    /// `Error::CommandFailed` if it exited unsuccessfully.
    fn execute(
        &self,
        output: &mut dyn Write,
        working_dir: &Path,
        command: &str,
        args: &[String],
    ) -> Result<()>;

    /// Run `command` to completion and return its standard output.
    ///
    /// Standard error is not streamed; on failure it is carried in
    /// `Error::CommandFailed`.
    fn execute_and_capture(
        &self,
        output: &mut dyn Write,
        working_dir: &Path,
        command: &str,
        args: &[String],
    ) -> Result<String>;
}

/// Executes commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for ProcessExecutor {
    fn execute(
        &self,
        output: &mut dyn Write,
        working_dir: &Path,
        command: &str,
        args: &[String],
    ) -> Result<()> {
        announce(output, command, args)?;
        log::debug!("Spawning {} in {}", command, working_dir.display());

        let mut child = Command::new(command)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (tx, rx) = mpsc::channel::<String>();

        thread::scope(|scope| {
            if let Some(stdout) = stdout {
                let tx = tx.clone();
                scope.spawn(move || forward_lines(stdout, tx));
            }
            if let Some(stderr) = stderr {
                let tx = tx.clone();
                scope.spawn(move || forward_lines(stderr, tx));
            }
            drop(tx);

            // Ends once both readers have hit EOF and dropped their senders.
            let mut sink_open = true;
            for line in rx {
                if sink_open && writeln!(output, "{}{}", CHILD_OUTPUT_INDENT, line).is_err() {
                    log::debug!(
                        "Output sink closed, discarding remaining output of {}",
                        command
                    );
                    sink_open = false;
                }
            }
        });

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                command: command.to_string(),
                status: status.to_string(),
                stderr: String::new(),
            })
        }
    }

    fn execute_and_capture(
        &self,
        output: &mut dyn Write,
        working_dir: &Path,
        command: &str,
        args: &[String],
    ) -> Result<String> {
        announce(output, command, args)?;

        let result = Command::new(command)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;

        if !result.status.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&result.stdout).into_owned())
    }
}

/// Read `pipe` line by line until EOF, sending each line (without its
/// terminator) to `tx`. Invalid UTF-8 is replaced rather than aborting.
fn forward_lines(pipe: impl Read, tx: mpsc::Sender<String>) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("Stopped reading child output: {}", e);
                break;
            }
        }
    }
}

fn announce(output: &mut dyn Write, command: &str, args: &[String]) -> Result<()> {
    let summary = summarized_args(args).join(" ");
    if summary.is_empty() {
        writeln!(output, "Executing: {}", command)?;
    } else {
        writeln!(output, "Executing: {} {}", command, summary)?;
    }
    Ok(())
}

/// Replace any argument longer than 30 characters with `...` so long values
/// such as commit messages do not flood the progress display.
pub fn summarized_args(args: &[String]) -> Vec<&str> {
    args.iter()
        .map(|arg| {
            if arg.chars().count() > MAX_DISPLAYED_ARG_LEN {
                "..."
            } else {
                arg.as_str()
            }
        })
        .collect()
}

/// Render a command line for humans, shell-escaping each argument.
///
/// Display only: commands are always executed with a literal argument vector.
pub fn format_command(command: &str, args: &[String]) -> String {
    std::iter::once(command)
        .chain(args.iter().map(String::as_str))
        .map(|word| shell_words::quote(word).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
