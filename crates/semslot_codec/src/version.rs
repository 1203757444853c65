//! The stored version value.

use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// An immutable semantic version.
///
/// `Ord` follows semver precedence and falls back to build metadata only to
/// break ties, so it stays consistent with `Eq`. Use [`Version::cmp_precedence`]
/// when build metadata must be ignored entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(semver::Version);

impl Version {
    /// Creates a release version with no prerelease or build metadata.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parses a version from stored text.
    ///
    /// Only the first whitespace-delimited token is considered, so the
    /// newline-terminated line written by [`Version::to_line`] parses back.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidVersion`] if the input is empty or the
    /// token is not a valid semantic version.
    pub fn parse(input: &str) -> CodecResult<Self> {
        let token = input
            .split_whitespace()
            .next()
            .ok_or_else(|| CodecError::invalid_version(input, "empty input"))?;

        semver::Version::parse(token)
            .map(Self)
            .map_err(|e| CodecError::invalid_version(input, e.to_string()))
    }

    /// Major component.
    pub fn major(&self) -> u64 {
        self.0.major
    }

    /// Minor component.
    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    /// Patch component.
    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Prerelease identifiers joined by dots, empty for a release.
    pub fn prerelease(&self) -> &str {
        self.0.pre.as_str()
    }

    /// Build metadata, empty if absent.
    pub fn build(&self) -> &str {
        self.0.build.as_str()
    }

    /// Returns true if this version carries a prerelease tag.
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// Compares by semver precedence, ignoring build metadata.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        (self.0.major, self.0.minor, self.0.patch, &self.0.pre).cmp(&(
            other.0.major,
            other.0.minor,
            other.0.patch,
            &other.0.pre,
        ))
    }

    /// Returns true if `self` has strictly higher precedence than `other`.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.cmp_precedence(other) == Ordering::Greater
    }

    /// The persisted form: the version followed by a newline.
    pub fn to_line(&self) -> String {
        format!("{}\n", self.0)
    }

    /// Borrows the underlying `semver` value.
    pub fn as_semver(&self) -> &semver::Version {
        &self.0
    }

    pub(crate) fn into_semver(self) -> semver::Version {
        self.0
    }
}

impl From<semver::Version> for Version {
    fn from(inner: semver::Version) -> Self {
        Self(inner)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Version {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
