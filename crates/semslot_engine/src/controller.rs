//! Slot controller state machine.

use crate::config::SlotConfig;
use crate::error::{SlotError, SlotResult};
use crate::store::{KeyProvisioner, RemoteStore, SyncKind, WriteOutcome};
use parking_lot::RwLock;
use semslot_codec::{BumpSpec, Version};
use std::time::Instant;
use tracing::{debug, info, warn};

/// The current state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No operation has run yet.
    Idle,
    /// Installing credentials.
    Provisioning,
    /// Bringing the replica to the remote tip.
    Syncing,
    /// Reading the current value from the replica.
    Reading,
    /// Proposing the new value.
    Writing,
    /// A write conflicted; about to sync again.
    Retrying,
    /// The last operation succeeded.
    Done,
    /// The last operation failed.
    Failed,
}

impl ControllerState {
    /// Returns true while an operation is running.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Provisioning | Self::Syncing | Self::Reading | Self::Writing | Self::Retrying
        )
    }

    /// Returns true if a new operation may start.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Done | Self::Failed)
    }
}

/// Statistics about controller operations.
#[derive(Debug, Clone, Default)]
pub struct ControllerStats {
    /// Operations that completed successfully.
    pub operations_completed: u64,
    /// Operations that ended in an error.
    pub operations_failed: u64,
    /// Write proposals made.
    pub write_attempts: u64,
    /// Proposals rejected as conflicts.
    pub conflicts: u64,
    /// Proposals that found the value already in place.
    pub noop_writes: u64,
    /// Writes that created a previously absent slot.
    pub slots_established: u64,
    /// Completion time of the last successful operation.
    pub last_success_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// How a successful write finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    /// The remote accepted the new value.
    Accepted,
    /// The value was already current.
    AlreadyCurrent,
}

/// Details of a successful write operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    /// The value now held by the slot.
    pub version: Version,
    /// Value read during the final, successful attempt (`None` if the slot
    /// did not exist yet).
    pub base: Option<Version>,
    /// Number of write attempts, including the successful one.
    pub attempts: u32,
    /// Number of attempts rejected as conflicts.
    pub conflicts: u32,
    /// How the final attempt finished.
    pub disposition: WriteDisposition,
}

impl AttemptReport {
    /// Returns true if this operation created the slot.
    pub fn established_slot(&self) -> bool {
        self.base.is_none() && self.disposition == WriteDisposition::Accepted
    }
}

/// Coordinates optimistic read-modify-write cycles against one slot.
///
/// Every write operation loops sync → read → compute → propose until the
/// store accepts the proposal (or finds it already in place). A conflict
/// restarts the cycle from a fresh sync so the next proposal is computed
/// from the value that beat it. Failures end the operation immediately.
///
/// One operation runs at a time per controller. Independent controllers,
/// in this or other processes, may race on the same slot.
pub struct SlotController<S: RemoteStore, K: KeyProvisioner> {
    config: SlotConfig,
    store: S,
    provisioner: K,
    state: RwLock<ControllerState>,
    stats: RwLock<ControllerStats>,
}

impl<S: RemoteStore, K: KeyProvisioner> SlotController<S, K> {
    /// Creates a controller.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: SlotConfig, store: S, provisioner: K) -> SlotResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            provisioner,
            state: RwLock::new(ControllerState::Idle),
            stats: RwLock::new(ControllerStats::default()),
        })
    }

    /// Gets the current state.
    pub fn state(&self) -> ControllerState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> ControllerStats {
        self.stats.read().clone()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    /// Gets the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bumps the slot, starting from `initial` if it does not exist yet.
    ///
    /// Returns the version that was written.
    pub fn bump(&self, spec: &BumpSpec, initial: &Version) -> SlotResult<Version> {
        self.bump_with_report(spec, initial)
            .map(|report| report.version)
    }

    /// Like [`bump`](Self::bump), with attempt details.
    pub fn bump_with_report(
        &self,
        spec: &BumpSpec,
        initial: &Version,
    ) -> SlotResult<AttemptReport> {
        self.run("bump", |this| {
            this.write_loop(|current| spec.apply(current.unwrap_or(initial)).map_err(Into::into))
        })
    }

    /// Sets the slot to exactly `target`.
    pub fn set_exact(&self, target: &Version) -> SlotResult<()> {
        self.set_exact_with_report(target).map(|_| ())
    }

    /// Like [`set_exact`](Self::set_exact), with attempt details.
    pub fn set_exact_with_report(&self, target: &Version) -> SlotResult<AttemptReport> {
        self.run("set", |this| this.write_loop(|_| Ok(target.clone())))
    }

    /// Reports versions newer than `cursor`.
    ///
    /// - empty slot: `[initial_version]`
    /// - no cursor: `[current]`
    /// - current newer than cursor: `[current]`
    /// - otherwise: `[]`
    pub fn check(&self, cursor: Option<&Version>) -> SlotResult<Vec<Version>> {
        self.run("check", |this| {
            this.provision()?;
            this.sync_replica(1)?;
            let current = this.read_current()?;

            let versions = match current {
                None => vec![this.config.initial_version.clone()],
                Some(current) => match cursor {
                    Some(cursor) if !current.is_newer_than(cursor) => Vec::new(),
                    _ => vec![current],
                },
            };
            Ok(versions)
        })
    }

    /// Runs one operation, maintaining state and stats around it.
    fn run<T>(&self, op: &str, body: impl FnOnce(&Self) -> SlotResult<T>) -> SlotResult<T> {
        {
            let mut state = self.state.write();
            if !state.can_start() {
                return Err(SlotError::InvalidStateTransition {
                    from: format!("{:?}", *state),
                    to: op.to_string(),
                });
            }
            *state = ControllerState::Provisioning;
        }

        debug!(op, file = %self.config.file, "starting slot operation");
        match body(self) {
            Ok(value) => {
                self.set_state(ControllerState::Done);
                let mut stats = self.stats.write();
                stats.operations_completed += 1;
                stats.last_success_time = Some(Instant::now());
                stats.last_error = None;
                Ok(value)
            }
            Err(e) => {
                self.handle_error(op, &e);
                Err(e)
            }
        }
    }

    /// The optimistic retry loop shared by `bump` and `set_exact`.
    fn write_loop<F>(&self, mut desired: F) -> SlotResult<AttemptReport>
    where
        F: FnMut(Option<&Version>) -> SlotResult<Version>,
    {
        self.provision()?;

        let mut attempts = 0u32;
        let mut conflicts = 0u32;

        loop {
            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    return Err(SlotError::RetriesExhausted { attempts });
                }
            }
            attempts += 1;

            self.sync_replica(attempts)?;
            let base = self.read_current()?;
            let target = desired(base.as_ref())?;

            self.set_state(ControllerState::Writing);
            if base.is_none() {
                debug!(attempt = attempts, version = %target, "slot is uninitialized, establishing it");
            }
            let message = self.config.commit_message_for(&target);
            self.stats.write().write_attempts += 1;

            let outcome = self
                .store
                .propose_write(&self.config.file, &target.to_line(), &message);
            debug!(attempt = attempts, outcome = outcome.label(), "write attempt classified");

            let disposition = match outcome {
                WriteOutcome::Accepted => WriteDisposition::Accepted,
                WriteOutcome::NoOpIdentical => WriteDisposition::AlreadyCurrent,
                WriteOutcome::ConflictDetected => {
                    conflicts += 1;
                    self.stats.write().conflicts += 1;
                    self.set_state(ControllerState::Retrying);
                    warn!(
                        attempt = attempts,
                        proposed = %target,
                        "slot moved since last sync, retrying against the new value"
                    );
                    continue;
                }
                WriteOutcome::Failed(e) => return Err(e),
            };

            {
                let mut stats = self.stats.write();
                match disposition {
                    WriteDisposition::Accepted if base.is_none() => stats.slots_established += 1,
                    WriteDisposition::AlreadyCurrent => stats.noop_writes += 1,
                    WriteDisposition::Accepted => {}
                }
            }
            info!(version = %target, attempts, conflicts, "slot updated");

            return Ok(AttemptReport {
                version: target,
                base,
                attempts,
                conflicts,
                disposition,
            });
        }
    }

    /// Installs the configured key, if any.
    fn provision(&self) -> SlotResult<()> {
        self.set_state(ControllerState::Provisioning);
        match &self.config.private_key {
            Some(key) => self.provisioner.ensure(key.expose()),
            None => Ok(()),
        }
    }

    fn sync_replica(&self, attempt: u32) -> SlotResult<SyncKind> {
        self.set_state(ControllerState::Syncing);
        let kind = self.store.sync()?;
        debug!(attempt, kind = ?kind, "replica synced");
        Ok(kind)
    }

    /// Reads and parses the slot. Unparseable content is fatal.
    fn read_current(&self) -> SlotResult<Option<Version>> {
        self.set_state(ControllerState::Reading);
        match self.store.read(&self.config.file)? {
            None => Ok(None),
            Some(raw) => match Version::parse(&raw) {
                Ok(version) => Ok(Some(version)),
                Err(source) => Err(SlotError::MalformedStoredValue { raw, source }),
            },
        }
    }

    fn set_state(&self, state: ControllerState) {
        *self.state.write() = state;
    }

    fn handle_error(&self, op: &str, error: &SlotError) {
        warn!(op, error = %error, "slot operation failed");
        self.set_state(ControllerState::Failed);
        let mut stats = self.stats.write();
        stats.operations_failed += 1;
        stats.last_error = Some(error.to_string());
    }
}
