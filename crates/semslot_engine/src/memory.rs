//! In-memory remote with per-client replicas.
//!
//! [`MemoryRemote`] plays the role of the shared repository branch: a file map
//! plus a revision counter that advances on every accepted write. Each
//! [`MemoryStore`] holds its own replica and may only publish when its replica
//! revision matches the remote tip, which is exactly a fast-forward push.

use crate::error::{SlotError, SlotResult};
use crate::store::{RemoteStore, SyncKind, WriteOutcome};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A commit recorded by [`MemoryRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Revision created by this commit.
    pub revision: u64,
    /// File written.
    pub path: String,
    /// Content written.
    pub value: String,
    /// Commit message.
    pub message: String,
}

#[derive(Debug, Default)]
struct RemoteState {
    revision: u64,
    files: HashMap<String, String>,
    history: Vec<CommitRecord>,
    unavailable: bool,
    failing_writes: u32,
}

/// The shared, authoritative side of the in-memory store.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    state: Mutex<RemoteState>,
}

impl MemoryRemote {
    /// Creates an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a remote whose tip already contains `path` = `content`.
    pub fn with_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        let remote = Self::new();
        remote
            .state
            .lock()
            .files
            .insert(path.into(), content.into());
        remote
    }

    /// Current tip revision.
    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    /// Content of `path` at the tip.
    pub fn file(&self, path: &str) -> Option<String> {
        self.state.lock().files.get(path).cloned()
    }

    /// Overwrites `path` at the tip as another writer would.
    pub fn force_write(&self, path: &str, content: &str) {
        let mut state = self.state.lock();
        state.revision += 1;
        let revision = state.revision;
        state.files.insert(path.to_string(), content.to_string());
        state.history.push(CommitRecord {
            revision,
            path: path.to_string(),
            value: content.to_string(),
            message: "external write".into(),
        });
    }

    /// All accepted commits, oldest first.
    pub fn history(&self) -> Vec<CommitRecord> {
        self.state.lock().history.clone()
    }

    /// Makes syncs fail with a transport error while `unavailable` is set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Makes the next `count` publishes fail with a transport error.
    pub fn fail_next_writes(&self, count: u32) {
        self.state.lock().failing_writes = count;
    }
}

#[derive(Debug, Clone)]
struct Replica {
    revision: u64,
    files: HashMap<String, String>,
}

/// One client's view of a [`MemoryRemote`].
#[derive(Debug)]
pub struct MemoryStore {
    remote: Arc<MemoryRemote>,
    replica: Mutex<Option<Replica>>,
}

impl MemoryStore {
    /// Creates a store with no replica yet.
    pub fn new(remote: Arc<MemoryRemote>) -> Self {
        Self {
            remote,
            replica: Mutex::new(None),
        }
    }

    /// The remote this store publishes to.
    pub fn remote(&self) -> &Arc<MemoryRemote> {
        &self.remote
    }

    /// Revision of the local replica, if one exists.
    pub fn replica_revision(&self) -> Option<u64> {
        self.replica.lock().as_ref().map(|r| r.revision)
    }
}

impl RemoteStore for MemoryStore {
    fn sync(&self) -> SlotResult<SyncKind> {
        let snapshot = {
            let state = self.remote.state.lock();
            if state.unavailable {
                return Err(SlotError::transport("remote unavailable"));
            }
            Replica {
                revision: state.revision,
                files: state.files.clone(),
            }
        };

        let mut replica = self.replica.lock();
        let kind = if replica.is_some() {
            SyncKind::Refreshed
        } else {
            SyncKind::Initialized
        };
        *replica = Some(snapshot);
        Ok(kind)
    }

    fn read(&self, path: &str) -> SlotResult<Option<String>> {
        let replica = self.replica.lock();
        let replica = replica
            .as_ref()
            .ok_or_else(|| SlotError::transport("replica has not been synced"))?;
        Ok(replica.files.get(path).cloned())
    }

    fn propose_write(&self, path: &str, value: &str, message: &str) -> WriteOutcome {
        let mut replica = self.replica.lock();
        let Some(replica) = replica.as_mut() else {
            return WriteOutcome::Failed(SlotError::transport("replica has not been synced"));
        };

        if replica.files.get(path).map(String::as_str) == Some(value) {
            return WriteOutcome::NoOpIdentical;
        }

        let mut state = self.remote.state.lock();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return WriteOutcome::Failed(SlotError::transport("publish failed"));
        }
        if state.revision != replica.revision {
            return WriteOutcome::ConflictDetected;
        }

        state.revision += 1;
        let revision = state.revision;
        state.files.insert(path.to_string(), value.to_string());
        state.history.push(CommitRecord {
            revision,
            path: path.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        });

        replica.revision = revision;
        replica.files.insert(path.to_string(), value.to_string());
        WriteOutcome::Accepted
    }
}
