//! Configuration for the slot controller.

use crate::error::{SlotError, SlotResult};
use semslot_codec::Version;
use std::fmt;
use std::path::{Component, Path};
use zeroize::Zeroizing;

/// Placeholder replaced by the target version in commit messages.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Transport key material, wiped from memory on drop.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    /// Wraps key material.
    pub fn new(material: impl Into<String>) -> Self {
        Self(Zeroizing::new(material.into()))
    }

    /// Returns the key material.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Configuration for one version slot.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    /// Path of the version file inside the repository.
    pub file: String,
    /// Version reported (and bumped from) while the slot does not exist.
    pub initial_version: Version,
    /// Key material to provision before remote operations.
    pub private_key: Option<SecretKey>,
    /// Commit message template; `{version}` is replaced with the target.
    pub commit_message: String,
    /// Upper bound on write attempts. `None` retries conflicts forever.
    pub max_attempts: Option<u32>,
}

impl SlotConfig {
    /// Creates a configuration for the given file path.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            initial_version: Version::default(),
            private_key: None,
            commit_message: format!("bump to {VERSION_PLACEHOLDER}"),
            max_attempts: None,
        }
    }

    /// Sets the initial version.
    pub fn with_initial_version(mut self, version: Version) -> Self {
        self.initial_version = version;
        self
    }

    /// Sets the key material.
    pub fn with_private_key(mut self, key: SecretKey) -> Self {
        self.private_key = Some(key);
        self
    }

    /// Sets the commit message template.
    pub fn with_commit_message(mut self, template: impl Into<String>) -> Self {
        self.commit_message = template.into();
        self
    }

    /// Caps the number of write attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Renders the commit message for `version`.
    pub fn commit_message_for(&self, version: &Version) -> String {
        self.commit_message
            .replace(VERSION_PLACEHOLDER, &version.to_string())
    }

    /// Checks that the configuration can address a slot.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidConfig`] if the file path is empty,
    /// absolute, or escapes the repository, or if the attempt cap is zero.
    pub fn validate(&self) -> SlotResult<()> {
        if self.file.trim().is_empty() {
            return Err(SlotError::InvalidConfig("file path is empty".into()));
        }

        let path = Path::new(&self.file);
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(SlotError::InvalidConfig(format!(
                "file path {:?} must be relative to the repository root",
                self.file
            )));
        }

        if self.max_attempts == Some(0) {
            return Err(SlotError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::new("version")
    }
}
