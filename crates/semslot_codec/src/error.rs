//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while parsing versions or building bumps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text is not a valid semantic version.
    #[error("invalid version {input:?}: {message}")]
    InvalidVersion {
        /// The rejected input.
        input: String,
        /// Description of the parse error.
        message: String,
    },

    /// The prerelease name is not a valid semver identifier.
    #[error("invalid prerelease name {name:?}: {message}")]
    InvalidPrerelease {
        /// The rejected name.
        name: String,
        /// Description of the problem.
        message: String,
    },

    /// The bump level is not one of major, minor, patch or final.
    #[error("unknown bump {0:?} (expected major, minor, patch or final)")]
    UnknownBump(String),

    /// A numeric component cannot be incremented any further.
    #[error("version component {component} overflowed")]
    Overflow {
        /// Name of the component that overflowed.
        component: &'static str,
    },
}

impl CodecError {
    /// Create an invalid version error.
    pub fn invalid_version(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create an invalid prerelease error.
    pub fn invalid_prerelease(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPrerelease {
            name: name.into(),
            message: message.into(),
        }
    }
}
