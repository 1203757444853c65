//! Git-backed remote store.

use crate::classify::{classify_commit, classify_push, CommitClass};
use crate::config::GitConfig;
use crate::runner::{GitRunner, ProcessRunner};
use semslot_engine::{RemoteStore, SlotError, SlotResult, SyncKind, WriteOutcome};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A [`RemoteStore`] over a git branch.
///
/// The replica directory is created by the first [`sync`](RemoteStore::sync)
/// (clone) and refreshed by later ones (fetch + hard reset), so local commits
/// left behind by a rejected push are discarded before the next read.
pub struct GitStore<R: GitRunner = ProcessRunner> {
    config: GitConfig,
    runner: R,
}

impl GitStore<ProcessRunner> {
    /// Creates a store running the configured git executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn open(config: GitConfig) -> SlotResult<Self> {
        let mut runner = ProcessRunner::new(&config.git_binary);
        if let Some(key) = &config.key_path {
            runner = runner.with_ssh_key(key);
        }
        Self::with_runner(config, runner)
    }
}

impl<R: GitRunner> GitStore<R> {
    /// Creates a store with a custom runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_runner(config: GitConfig, runner: R) -> SlotResult<Self> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GitConfig {
        &self.config
    }

    /// Returns the runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Returns true if the replica has been cloned.
    pub fn is_initialized(&self) -> bool {
        self.config.work_dir.join(".git").exists()
    }

    fn file_path(&self, path: &str) -> PathBuf {
        self.config.work_dir.join(path)
    }

    /// Runs git in the replica and fails on a non-zero exit.
    fn git(&self, args: &[&str]) -> SlotResult<()> {
        self.runner
            .run(Some(self.config.work_dir.as_path()), args)?
            .into_result(args)?;
        Ok(())
    }

    /// `-c` options placed before a committing subcommand.
    fn identity_args(&self) -> Vec<String> {
        let mut args = vec!["-c".to_string(), "commit.gpgsign=false".to_string()];
        if let Some(author) = &self.config.author {
            args.push("-c".into());
            args.push(format!("user.name={}", author.name));
            args.push("-c".into());
            args.push(format!("user.email={}", author.email));
        }
        args
    }

    /// Returns true if the replica's `origin` is the configured URI.
    fn replica_matches_uri(&self) -> SlotResult<bool> {
        let output = self.runner.run(
            Some(self.config.work_dir.as_path()),
            &["config", "--get", "remote.origin.url"],
        )?;
        Ok(output.success && output.stdout.trim() == self.config.uri)
    }

    fn clone_replica(&self) -> SlotResult<()> {
        if let Some(parent) = self.config.work_dir.parent() {
            fs::create_dir_all(parent)?;
        }
        let work_dir = self.config.work_dir.to_string_lossy().into_owned();
        let args = [
            "clone",
            "--branch",
            self.config.branch.as_str(),
            "--",
            self.config.uri.as_str(),
            work_dir.as_str(),
        ];
        self.runner.run(None, &args)?.into_result(&args)?;
        Ok(())
    }

    fn write_file(&self, path: &Path, value: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, value)
    }
}

impl<R: GitRunner> RemoteStore for GitStore<R> {
    fn sync(&self) -> SlotResult<SyncKind> {
        let reusable = self.is_initialized() && self.replica_matches_uri()?;
        let kind = if reusable {
            self.git(&["fetch", "origin", self.config.branch.as_str()])?;
            SyncKind::Refreshed
        } else {
            if self.config.work_dir.exists() {
                warn!(
                    work_dir = %self.config.work_dir.display(),
                    uri = %self.config.uri,
                    "replica directory belongs to another repository, cloning afresh"
                );
                fs::remove_dir_all(&self.config.work_dir)?;
            }
            self.clone_replica()?;
            SyncKind::Initialized
        };

        let tracking = self.config.tracking_ref();
        self.git(&["reset", "--hard", tracking.as_str()])?;
        debug!(kind = ?kind, branch = %self.config.branch, "replica at branch tip");
        Ok(kind)
    }

    fn read(&self, path: &str) -> SlotResult<Option<String>> {
        match fs::read_to_string(self.file_path(path)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SlotError::Io(e)),
        }
    }

    fn propose_write(&self, path: &str, value: &str, message: &str) -> WriteOutcome {
        if let Err(e) = self.write_file(&self.file_path(path), value) {
            return WriteOutcome::Failed(SlotError::Io(e));
        }

        if let Err(e) = self.git(&["add", "--", path]) {
            return WriteOutcome::Failed(e);
        }

        let mut commit_args = self.identity_args();
        commit_args.extend(["commit".to_string(), "-m".to_string(), message.to_string()]);
        let commit_args: Vec<&str> = commit_args.iter().map(String::as_str).collect();
        let commit = match self.runner.run(Some(self.config.work_dir.as_path()), &commit_args) {
            Ok(output) => output,
            Err(e) => return WriteOutcome::Failed(e.into()),
        };
        match classify_commit(&commit) {
            CommitClass::NothingToCommit => {
                debug!(path, "value already committed at branch tip");
                return WriteOutcome::NoOpIdentical;
            }
            CommitClass::Failed(output) => {
                return WriteOutcome::Failed(SlotError::transport(format!(
                    "commit failed: {output}"
                )));
            }
            CommitClass::Committed => {}
        }

        let refspec = self.config.push_refspec();
        let push = match self
            .runner
            .run(Some(self.config.work_dir.as_path()), &["push", "origin", refspec.as_str()])
        {
            Ok(output) => output,
            Err(e) => return WriteOutcome::Failed(e.into()),
        };

        let outcome = classify_push(&push);
        if matches!(outcome, WriteOutcome::Accepted) {
            info!(path, branch = %self.config.branch, "pushed {}", message);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{GitOutput, ScriptedRunner};
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> GitStore<ScriptedRunner> {
        let config = GitConfig::in_dir("git@example.com:org/versions.git", dir.path())
            .with_branch("version");
        GitStore::with_runner(config, ScriptedRunner::new()).unwrap()
    }

    #[test]
    fn first_sync_clones_then_fetches() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(store.sync().unwrap(), SyncKind::Initialized);
        let invocations = store.runner().invocations();
        assert_eq!(invocations[0].dir, None);
        let expected: Vec<String> = vec![
            "clone".into(),
            "--branch".into(),
            "version".into(),
            "--".into(),
            "git@example.com:org/versions.git".into(),
            store.config().work_dir.to_string_lossy().into_owned(),
        ];
        assert_eq!(invocations[0].args, expected);
        assert_eq!(invocations[1].args, vec!["reset", "--hard", "origin/version"]);

        // Simulate the clone having created the replica.
        fs::create_dir_all(store.config().work_dir.join(".git")).unwrap();
        store
            .runner()
            .push(GitOutput::ok("git@example.com:org/versions.git\n"));
        assert_eq!(store.sync().unwrap(), SyncKind::Refreshed);
        assert_eq!(
            store.runner().subcommands(),
            vec!["clone", "reset", "config", "fetch", "reset"]
        );
    }

    #[test]
    fn replica_of_another_repository_is_recloned() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let work_dir = store.config().work_dir.clone();
        fs::create_dir_all(work_dir.join(".git")).unwrap();
        fs::write(work_dir.join("version"), "9.0.0\n").unwrap();
        store
            .runner()
            .push(GitOutput::ok("git@example.com:org/other.git\n"));

        assert_eq!(store.sync().unwrap(), SyncKind::Initialized);
        assert_eq!(store.runner().subcommands(), vec!["config", "clone", "reset"]);
        // The stale checkout is gone; the scripted clone created nothing.
        assert!(!work_dir.exists());
    }

    #[test]
    fn replica_without_origin_is_recloned() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.config().work_dir.join(".git")).unwrap();
        store.runner().push(GitOutput::failed(1, ""));

        assert_eq!(store.sync().unwrap(), SyncKind::Initialized);
        assert_eq!(store.runner().subcommands(), vec!["config", "clone", "reset"]);
    }

    #[test]
    fn failed_fetch_is_transport_error() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.config().work_dir.join(".git")).unwrap();
        store
            .runner()
            .push(GitOutput::ok("git@example.com:org/versions.git\n"));
        store
            .runner()
            .push(GitOutput::failed(128, "fatal: Could not read from remote repository."));

        let err = store.sync().unwrap_err();
        assert!(err.is_transport());
        assert_eq!(store.runner().subcommands(), vec!["config", "fetch"]);
    }

    #[test]
    fn read_missing_and_present() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.read("version").unwrap(), None);

        fs::create_dir_all(&store.config().work_dir).unwrap();
        fs::write(store.config().work_dir.join("version"), "1.2.3\n").unwrap();
        assert_eq!(store.read("version").unwrap().as_deref(), Some("1.2.3\n"));
    }

    #[test]
    fn accepted_write_runs_add_commit_push() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.runner().push(GitOutput::ok(""));
        store.runner().push(GitOutput::ok("[version abc1234] bump to 1.0.1"));
        store
            .runner()
            .push(GitOutput::ok("To example\n   abc..def  HEAD -> version"));

        let outcome = store.propose_write("nested/version", "1.0.1\n", "bump to 1.0.1");
        assert!(matches!(outcome, WriteOutcome::Accepted));

        let written = fs::read_to_string(store.config().work_dir.join("nested/version")).unwrap();
        assert_eq!(written, "1.0.1\n");

        let invocations = store.runner().invocations();
        assert_eq!(invocations[0].args, vec!["add", "--", "nested/version"]);
        assert_eq!(
            invocations[1].args,
            vec!["-c", "commit.gpgsign=false", "commit", "-m", "bump to 1.0.1"]
        );
        assert_eq!(invocations[2].args, vec!["push", "origin", "HEAD:version"]);
    }

    #[test]
    fn nothing_to_commit_skips_push() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.runner().push(GitOutput::ok(""));
        store.runner().push(GitOutput {
            success: false,
            code: Some(1),
            stdout: "nothing to commit, working tree clean".into(),
            stderr: String::new(),
        });

        let outcome = store.propose_write("version", "1.0.0\n", "bump to 1.0.0");
        assert!(matches!(outcome, WriteOutcome::NoOpIdentical));
        assert_eq!(store.runner().subcommands(), vec!["add", "commit"]);
    }

    #[test]
    fn rejected_push_is_conflict() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.runner().push(GitOutput::ok(""));
        store.runner().push(GitOutput::ok("[version abc1234] bump"));
        store.runner().push(GitOutput::failed(
            1,
            " ! [rejected]        HEAD -> version (fetch first)",
        ));

        let outcome = store.propose_write("version", "1.0.1\n", "bump to 1.0.1");
        assert!(matches!(outcome, WriteOutcome::ConflictDetected));
    }

    #[test]
    fn failed_add_or_commit_is_failed() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .runner()
            .push(GitOutput::failed(128, "fatal: not a git repository"));
        assert!(matches!(
            store.propose_write("version", "1.0.1\n", "m"),
            WriteOutcome::Failed(_)
        ));

        store.runner().push(GitOutput::ok(""));
        store
            .runner()
            .push(GitOutput::failed(128, "Please tell me who you are."));
        assert!(matches!(
            store.propose_write("version", "1.0.1\n", "m"),
            WriteOutcome::Failed(_)
        ));
        assert!(!store.runner().subcommands().contains(&"push".to_string()));
    }

    #[test]
    fn author_is_passed_as_config() {
        let dir = TempDir::new().unwrap();
        let config = GitConfig::in_dir("repo", dir.path())
            .with_author(crate::config::CommitAuthor::new("ci bot", "ci@example.com"));
        let store = GitStore::with_runner(config, ScriptedRunner::new()).unwrap();

        let _ = store.propose_write("version", "0.0.1\n", "bump to 0.0.1");
        let commit = &store.runner().invocations()[1];
        assert!(commit.args.contains(&"user.name=ci bot".to_string()));
        assert!(commit.args.contains(&"user.email=ci@example.com".to_string()));
    }
}
