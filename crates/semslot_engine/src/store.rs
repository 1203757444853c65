//! Remote store and credential abstractions.

use crate::error::{SlotError, SlotResult};

/// Marker present in PEM blocks of passphrase-protected keys.
pub const ENCRYPTED_KEY_MARKER: &str = "ENCRYPTED";

/// Returns true if `material` is a passphrase-protected key.
pub fn is_encrypted_key(material: &str) -> bool {
    material.contains(ENCRYPTED_KEY_MARKER)
}

/// How a [`RemoteStore::sync`] reached the branch tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    /// The local replica was created.
    Initialized,
    /// An existing replica was refreshed.
    Refreshed,
}

/// Classified result of a write attempt.
///
/// Implementations must never report [`WriteOutcome::Accepted`] unless the
/// remote has taken the write; an uncertain result must be
/// `ConflictDetected` or `Failed`.
#[derive(Debug)]
pub enum WriteOutcome {
    /// The value was published and is now the slot's current value.
    Accepted,
    /// The remote moved since the last sync; re-read and try again.
    ConflictDetected,
    /// The synced value already equals the proposed value.
    NoOpIdentical,
    /// The attempt failed for a reason retrying will not fix.
    Failed(SlotError),
}

impl WriteOutcome {
    /// Returns true if the proposed value is now current.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted | Self::NoOpIdentical)
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::ConflictDetected => "conflict",
            Self::NoOpIdentical => "no-op",
            Self::Failed(_) => "failed",
        }
    }
}

/// A versioned remote text resource with a local replica.
///
/// Calls block until the remote round-trip completes or fails.
pub trait RemoteStore: Send + Sync {
    /// Brings the local replica to the tip of the configured branch.
    ///
    /// First-time initialization and refresh converge to the same state:
    /// the replica equals the remote tip.
    fn sync(&self) -> SlotResult<SyncKind>;

    /// Reads `path` from the replica.
    ///
    /// Returns `Ok(None)` when the file simply does not exist.
    fn read(&self, path: &str) -> SlotResult<Option<String>>;

    /// Writes `value` to `path`, publishes it with `message` and classifies
    /// the result.
    fn propose_write(&self, path: &str, value: &str, message: &str) -> WriteOutcome;
}

/// Makes transport credentials available before remote operations.
pub trait KeyProvisioner: Send + Sync {
    /// Persists `material` for the transport if it is not already in place.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::UnsupportedCredential`] for passphrase-protected
    /// material, before touching anything.
    fn ensure(&self, material: &str) -> SlotResult<()>;
}

/// A provisioner for transports that need no key (e.g. https or file URIs).
///
/// Still rejects encrypted material so misconfiguration is caught early.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeyProvisioner;

impl KeyProvisioner for NoKeyProvisioner {
    fn ensure(&self, material: &str) -> SlotResult<()> {
        if is_encrypted_key(material) {
            return Err(SlotError::UnsupportedCredential(
                "private keys with passphrases are not supported".into(),
            ));
        }
        Ok(())
    }
}
