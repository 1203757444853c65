//! Git command execution.
//!
//! The store talks to git through the [`GitRunner`] trait so the protocol can
//! be exercised against scripted output without a git binary.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors from running git.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git process could not be started.
    #[error("failed to run `git {command}`: {source}")]
    Spawn {
        /// The command line (without the binary).
        command: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// git exited unsuccessfully.
    #[error("`git {command}` exited with {status}: {output}")]
    Exit {
        /// The command line (without the binary).
        command: String,
        /// Exit status description.
        status: String,
        /// Combined stdout and stderr.
        output: String,
    },
}

impl From<GitError> for semslot_engine::SlotError {
    fn from(err: GitError) -> Self {
        Self::transport(err.to_string())
    }
}

/// Captured result of a git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    /// Whether git exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl GitOutput {
    /// A successful invocation with the given output.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed invocation with the given stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !self.stderr.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }

    /// Converts a failed invocation into an error.
    pub fn into_result(self, args: &[&str]) -> Result<Self, GitError> {
        if self.success {
            return Ok(self);
        }
        Err(GitError::Exit {
            command: args.join(" "),
            status: self
                .code
                .map(|c| format!("status {c}"))
                .unwrap_or_else(|| "signal".into()),
            output: self.combined().trim().to_string(),
        })
    }
}

/// Runs git commands.
pub trait GitRunner: Send + Sync {
    /// Runs git with `args`, in `dir` if given.
    ///
    /// A non-zero exit is reported through [`GitOutput::success`], not as an
    /// error; errors mean git could not be run at all.
    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<GitOutput, GitError>;
}

/// Runs the real git executable.
///
/// Output is forced to the C locale so the classifier sees the phrases it
/// knows, and prompts are disabled so a missing credential fails instead of
/// hanging.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    binary: PathBuf,
    ssh_key: Option<PathBuf>,
}

impl ProcessRunner {
    /// Creates a runner for `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ssh_key: None,
        }
    }

    /// Makes ssh transports authenticate with the key at `path`.
    pub fn with_ssh_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_key = Some(path.into());
        self
    }

    /// Value passed as `GIT_SSH_COMMAND`, if a key is configured.
    pub fn ssh_command(&self) -> Option<String> {
        self.ssh_key.as_ref().map(|path| {
            let quoted = path.display().to_string().replace('\'', r"'\''");
            format!("ssh -i '{quoted}' -o IdentitiesOnly=yes")
        })
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRunner for ProcessRunner {
    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<GitOutput, GitError> {
        debug!(?dir, command = %args.join(" "), "running git");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        if let Some(ssh) = self.ssh_command() {
            command.env("GIT_SSH_COMMAND", ssh);
        }

        let output = command.output().map_err(|source| GitError::Spawn {
            command: args.join(" "),
            source,
        })?;

        Ok(GitOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// A recorded [`ScriptedRunner`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Working directory.
    pub dir: Option<PathBuf>,
    /// Arguments.
    pub args: Vec<String>,
}

/// A runner that replays queued outputs, for testing.
///
/// Once the queue is empty every command succeeds with no output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: Mutex<VecDeque<GitOutput>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    /// Creates an empty runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the output of the next command.
    pub fn push(&self, output: GitOutput) {
        self.outputs.lock().push_back(output);
    }

    /// All commands run so far.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    /// The git subcommands run so far, e.g. `["clone", "reset"]`.
    ///
    /// Leading `-c key=value` options are skipped.
    pub fn subcommands(&self) -> Vec<String> {
        self.invocations
            .lock()
            .iter()
            .filter_map(|inv| {
                let mut args = inv.args.iter();
                while let Some(arg) = args.next() {
                    if arg == "-c" {
                        args.next();
                        continue;
                    }
                    return Some(arg.clone());
                }
                None
            })
            .collect()
    }
}

impl GitRunner for ScriptedRunner {
    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<GitOutput, GitError> {
        self.invocations.lock().push(Invocation {
            dir: dir.map(Path::to_path_buf),
            args: args.iter().map(|a| a.to_string()).collect(),
        });
        Ok(self
            .outputs
            .lock()
            .pop_front()
            .unwrap_or_else(|| GitOutput::ok("")))
    }
}
