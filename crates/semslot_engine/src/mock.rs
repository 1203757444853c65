//! Scripted store and provisioner for testing.

use crate::error::{SlotError, SlotResult};
use crate::store::{is_encrypted_key, KeyProvisioner, RemoteStore, SyncKind, WriteOutcome};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A call observed by [`MockStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `sync()`.
    Sync,
    /// `read(path)`.
    Read(String),
    /// `propose_write(path, value, message)`.
    Write {
        /// Path written.
        path: String,
        /// Value proposed.
        value: String,
        /// Commit message.
        message: String,
    },
}

/// A store that replays scripted reads and write outcomes.
///
/// Each read pops the next scripted value; the last one keeps being returned.
/// Each write pops the next scripted outcome; once the script is exhausted
/// writes are accepted.
#[derive(Debug, Default)]
pub struct MockStore {
    reads: Mutex<VecDeque<Option<String>>>,
    writes: Mutex<VecDeque<WriteOutcome>>,
    sync_error: Mutex<Option<String>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockStore {
    /// Creates a store with an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a value for the next read (`None` for an absent slot).
    pub fn push_read(&self, value: Option<&str>) {
        self.reads.lock().push_back(value.map(str::to_string));
    }

    /// Queues the outcome of the next write.
    pub fn push_write(&self, outcome: WriteOutcome) {
        self.writes.lock().push_back(outcome);
    }

    /// Makes every sync fail with a transport error.
    pub fn set_sync_error(&self, message: impl Into<String>) {
        *self.sync_error.lock() = Some(message.into());
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Values proposed by writes, in order.
    pub fn written_values(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                MockCall::Write { value, .. } => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of sync calls.
    pub fn sync_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, MockCall::Sync))
            .count()
    }
}

impl RemoteStore for MockStore {
    fn sync(&self) -> SlotResult<SyncKind> {
        let first = {
            let mut calls = self.calls.lock();
            let first = !calls.iter().any(|c| matches!(c, MockCall::Sync));
            calls.push(MockCall::Sync);
            first
        };
        if let Some(message) = self.sync_error.lock().clone() {
            return Err(SlotError::transport(message));
        }
        Ok(if first {
            SyncKind::Initialized
        } else {
            SyncKind::Refreshed
        })
    }

    fn read(&self, path: &str) -> SlotResult<Option<String>> {
        self.calls.lock().push(MockCall::Read(path.to_string()));
        let mut reads = self.reads.lock();
        let value = if reads.len() > 1 {
            reads.pop_front().flatten()
        } else {
            reads.front().cloned().flatten()
        };
        Ok(value)
    }

    fn propose_write(&self, path: &str, value: &str, message: &str) -> WriteOutcome {
        self.calls.lock().push(MockCall::Write {
            path: path.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        });
        self.writes
            .lock()
            .pop_front()
            .unwrap_or(WriteOutcome::Accepted)
    }
}

/// A provisioner that records what it was asked to install.
#[derive(Debug, Default)]
pub struct MockProvisioner {
    installed: Mutex<Vec<String>>,
    attempts: Mutex<u32>,
}

impl MockProvisioner {
    /// Creates a provisioner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `ensure` calls, including rejected ones.
    pub fn attempts(&self) -> u32 {
        *self.attempts.lock()
    }

    /// Material accepted so far.
    pub fn installed(&self) -> Vec<String> {
        self.installed.lock().clone()
    }
}

impl KeyProvisioner for MockProvisioner {
    fn ensure(&self, material: &str) -> SlotResult<()> {
        *self.attempts.lock() += 1;
        if is_encrypted_key(material) {
            return Err(SlotError::UnsupportedCredential(
                "private keys with passphrases are not supported".into(),
            ));
        }
        let mut installed = self.installed.lock();
        if !installed.iter().any(|m| m == material) {
            installed.push(material.to_string());
        }
        Ok(())
    }
}
