//! Error types for slot operations.

use semslot_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for slot operations.
pub type SlotResult<T> = Result<T, SlotError>;

/// Errors that can end a slot operation.
///
/// Conflicts are not errors: they are reported as
/// [`WriteOutcome::ConflictDetected`](crate::WriteOutcome::ConflictDetected)
/// and consumed by the controller's retry loop.
#[derive(Error, Debug)]
pub enum SlotError {
    /// The credential material cannot be used (e.g. passphrase-protected key).
    #[error("unsupported credential: {0}")]
    UnsupportedCredential(String),

    /// Clone, fetch, commit or push failed for a reason other than a conflict.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The slot holds text that is not a version.
    #[error("malformed stored value {raw:?}: {source}")]
    MalformedStoredValue {
        /// The stored text.
        raw: String,
        /// Why it failed to parse.
        #[source]
        source: CodecError,
    },

    /// Computing the next version failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The optional attempt cap was reached while conflicts persisted.
    #[error("gave up after {attempts} conflicting write attempts")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// An operation was started while another was still running.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted operation.
        to: String,
    },
}

impl SlotError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns true for credential rejections.
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::UnsupportedCredential(_))
    }

    /// Returns true for transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert!(SlotError::transport("push failed").is_transport());
        assert!(SlotError::UnsupportedCredential("encrypted".into()).is_credential());
        assert!(!SlotError::RetriesExhausted { attempts: 3 }.is_transport());
    }

    #[test]
    fn error_display() {
        let err = SlotError::transport("exit status 128");
        assert_eq!(err.to_string(), "transport error: exit status 128");

        let source = semslot_codec::Version::parse("garbage").unwrap_err();
        let err = SlotError::MalformedStoredValue {
            raw: "garbage".into(),
            source,
        };
        assert!(err.to_string().contains("garbage"));

        let err = SlotError::RetriesExhausted { attempts: 7 };
        assert!(err.to_string().contains('7'));
    }
}
