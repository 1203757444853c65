//! Configuration for the git store.

use semslot_engine::{SlotError, SlotResult};
use std::path::{Path, PathBuf};

/// Directory name of the working replica under a base directory.
pub const REPLICA_DIR_NAME: &str = "semslot-git-repo";

/// File name of the provisioned key under a base directory.
pub const KEY_FILE_NAME: &str = "private-key";

/// Identity used for version commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    /// Author name.
    pub name: String,
    /// Author email.
    pub email: String,
}

impl CommitAuthor {
    /// Creates an author.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Where the slot lives and where its replica is kept.
#[derive(Debug, Clone)]
pub struct GitConfig {
    /// Repository URI (ssh, https or local path).
    pub uri: String,
    /// Branch holding the version file.
    pub branch: String,
    /// Local working replica.
    pub work_dir: PathBuf,
    /// Key file used for ssh transport, if any.
    pub key_path: Option<PathBuf>,
    /// Git executable.
    pub git_binary: PathBuf,
    /// Commit identity; falls back to the ambient git configuration.
    pub author: Option<CommitAuthor>,
}

impl GitConfig {
    /// Creates a configuration with an explicit replica directory.
    pub fn new(uri: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            branch: "master".into(),
            work_dir: work_dir.into(),
            key_path: None,
            git_binary: PathBuf::from("git"),
            author: None,
        }
    }

    /// Creates a configuration keeping its replica under `base`.
    pub fn in_dir(uri: impl Into<String>, base: &Path) -> Self {
        Self::new(uri, base.join(REPLICA_DIR_NAME))
    }

    /// Key path conventionally used next to a replica under `base`.
    pub fn default_key_path(base: &Path) -> PathBuf {
        base.join(KEY_FILE_NAME)
    }

    /// Sets the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Uses the key at `path` for ssh transport.
    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    /// Sets the git executable.
    pub fn with_git_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.git_binary = binary.into();
        self
    }

    /// Sets the commit identity.
    pub fn with_author(mut self, author: CommitAuthor) -> Self {
        self.author = Some(author);
        self
    }

    /// Remote-tracking ref of the branch.
    pub fn tracking_ref(&self) -> String {
        format!("origin/{}", self.branch)
    }

    /// Push refspec publishing the local head to the branch.
    pub fn push_refspec(&self) -> String {
        format!("HEAD:{}", self.branch)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidConfig`] for an empty URI, or a branch
    /// that is empty or could be mistaken for a command-line option.
    pub fn validate(&self) -> SlotResult<()> {
        if self.uri.trim().is_empty() {
            return Err(SlotError::InvalidConfig("repository uri is empty".into()));
        }
        if self.branch.trim().is_empty() {
            return Err(SlotError::InvalidConfig("branch is empty".into()));
        }
        if self.branch.starts_with('-') || self.uri.starts_with('-') {
            return Err(SlotError::InvalidConfig(
                "uri and branch must not start with '-'".into(),
            ));
        }
        Ok(())
    }
}
