//! Bump rules.

use crate::error::{CodecError, CodecResult};
use crate::version::Version;
use semver::Prerelease;
use std::fmt;

/// The level component of a bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BumpLevel {
    /// `major+1`, minor and patch reset, prerelease cleared.
    Major,
    /// `minor+1`, patch reset, prerelease cleared.
    Minor,
    /// `patch+1`, prerelease cleared.
    Patch,
    /// Prerelease cleared, numbers kept.
    Final,
}

impl BumpLevel {
    /// Parses a level name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownBump`] for anything other than
    /// `major`, `minor`, `patch` or `final`.
    pub fn parse(name: &str) -> CodecResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "final" => Ok(Self::Final),
            _ => Err(CodecError::UnknownBump(name.to_string())),
        }
    }

    /// Returns the lowercase name of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated prerelease name such as `rc` or `beta`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrereleaseName(String);

impl PrereleaseName {
    /// Validates a prerelease name.
    ///
    /// The name must be a single semver identifier (no dots).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidPrerelease`] if the name is empty,
    /// contains a dot, or is not a legal semver identifier.
    pub fn new(name: impl Into<String>) -> CodecResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CodecError::invalid_prerelease(name, "name is empty"));
        }
        if name.contains('.') {
            return Err(CodecError::invalid_prerelease(
                name,
                "name must be a single identifier",
            ));
        }
        Prerelease::new(&name).map_err(|e| CodecError::invalid_prerelease(&name, e.to_string()))?;
        Ok(Self(name))
    }

    /// Returns the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Computes `name.N` following `current`.
    ///
    /// Continues the counter when `current` is `name.N`, starts at 1 otherwise.
    fn next_after(&self, current: &Prerelease) -> CodecResult<Prerelease> {
        let mut idents = current.as_str().split('.');
        let previous = match (idents.next(), idents.next()) {
            (Some(head), Some(counter)) if head == self.0 => counter.parse::<u64>().ok(),
            _ => None,
        };

        let counter = match previous {
            Some(n) => n.checked_add(1).ok_or(CodecError::Overflow {
                component: "prerelease",
            })?,
            None => 1,
        };

        let text = format!("{}.{}", self.0, counter);
        Prerelease::new(&text).map_err(|e| CodecError::invalid_prerelease(&self.0, e.to_string()))
    }
}

impl fmt::Display for PrereleaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transformation advancing a version.
///
/// The level (if any) is applied first, then the prerelease (if any), so
/// `minor` + `rc` takes `1.2.3` to `1.3.0-rc.1`. A bump with neither is the
/// identity. Build metadata is carried over unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BumpSpec {
    level: Option<BumpLevel>,
    pre: Option<PrereleaseName>,
}

impl BumpSpec {
    /// The bump that leaves a version unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// A bump of the given level.
    pub fn level(level: BumpLevel) -> Self {
        Self {
            level: Some(level),
            pre: None,
        }
    }

    /// A major bump.
    pub fn major() -> Self {
        Self::level(BumpLevel::Major)
    }

    /// A minor bump.
    pub fn minor() -> Self {
        Self::level(BumpLevel::Minor)
    }

    /// A patch bump.
    pub fn patch() -> Self {
        Self::level(BumpLevel::Patch)
    }

    /// Promotes a prerelease to its final release.
    pub fn finalize() -> Self {
        Self::level(BumpLevel::Final)
    }

    /// A prerelease bump with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid prerelease identifier.
    pub fn prerelease(name: &str) -> CodecResult<Self> {
        Ok(Self {
            level: None,
            pre: Some(PrereleaseName::new(name)?),
        })
    }

    /// Adds a prerelease step after the level step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid prerelease identifier.
    pub fn with_prerelease(mut self, name: &str) -> CodecResult<Self> {
        self.pre = Some(PrereleaseName::new(name)?);
        Ok(self)
    }

    /// Builds a bump from loosely typed parameters.
    ///
    /// Empty strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown level or an invalid prerelease name.
    pub fn from_params(bump: Option<&str>, pre: Option<&str>) -> CodecResult<Self> {
        let level = match bump.filter(|s| !s.is_empty()) {
            Some(name) => Some(BumpLevel::parse(name)?),
            None => None,
        };
        let pre = match pre.filter(|s| !s.is_empty()) {
            Some(name) => Some(PrereleaseName::new(name)?),
            None => None,
        };
        Ok(Self { level, pre })
    }

    /// Returns the level step, if any.
    pub fn level_step(&self) -> Option<BumpLevel> {
        self.level
    }

    /// Returns the prerelease step, if any.
    pub fn prerelease_step(&self) -> Option<&PrereleaseName> {
        self.pre.as_ref()
    }

    /// Returns true if applying this bump never changes a version.
    pub fn is_identity(&self) -> bool {
        self.level.is_none() && self.pre.is_none()
    }

    /// Applies the bump to `current`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Overflow`] if a numeric component is already at
    /// its maximum.
    pub fn apply(&self, current: &Version) -> CodecResult<Version> {
        let mut next = current.clone().into_semver();

        if let Some(level) = self.level {
            match level {
                BumpLevel::Major => {
                    next.major = increment(next.major, "major")?;
                    next.minor = 0;
                    next.patch = 0;
                }
                BumpLevel::Minor => {
                    next.minor = increment(next.minor, "minor")?;
                    next.patch = 0;
                }
                BumpLevel::Patch => {
                    next.patch = increment(next.patch, "patch")?;
                }
                BumpLevel::Final => {}
            }
            next.pre = Prerelease::EMPTY;
        }

        if let Some(name) = &self.pre {
            next.pre = name.next_after(&next.pre)?;
        }

        Ok(Version::from(next))
    }
}

impl fmt::Display for BumpSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.level, &self.pre) {
            (None, None) => f.write_str("identity"),
            (Some(level), None) => write!(f, "{level}"),
            (None, Some(pre)) => write!(f, "pre:{pre}"),
            (Some(level), Some(pre)) => write!(f, "{level}+pre:{pre}"),
        }
    }
}

fn increment(value: u64, component: &'static str) -> CodecResult<u64> {
    value
        .checked_add(1)
        .ok_or(CodecError::Overflow { component })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn level_bumps() {
        assert_eq!(BumpSpec::major().apply(&v("1.2.3")).unwrap(), v("2.0.0"));
        assert_eq!(BumpSpec::minor().apply(&v("1.2.3")).unwrap(), v("1.3.0"));
        assert_eq!(BumpSpec::patch().apply(&v("1.2.3")).unwrap(), v("1.2.4"));
        assert_eq!(BumpSpec::patch().apply(&v("0.0.0")).unwrap(), v("0.0.1"));
    }

    #[test]
    fn level_bumps_clear_prerelease() {
        assert_eq!(BumpSpec::major().apply(&v("1.2.3-rc.2")).unwrap(), v("2.0.0"));
        assert_eq!(BumpSpec::patch().apply(&v("1.2.3-rc.2")).unwrap(), v("1.2.4"));
    }

    #[test]
    fn final_promotes_prerelease() {
        assert_eq!(BumpSpec::finalize().apply(&v("1.2.3-rc.2")).unwrap(), v("1.2.3"));
        // Already final: unchanged.
        assert_eq!(BumpSpec::finalize().apply(&v("1.2.3")).unwrap(), v("1.2.3"));
    }

    #[test]
    fn prerelease_counter() {
        let rc = BumpSpec::prerelease("rc").unwrap();
        assert_eq!(rc.apply(&v("1.2.3")).unwrap(), v("1.2.3-rc.1"));
        assert_eq!(rc.apply(&v("1.2.3-rc.1")).unwrap(), v("1.2.3-rc.2"));
        assert_eq!(rc.apply(&v("1.2.3-beta.7")).unwrap(), v("1.2.3-rc.1"));
        assert_eq!(rc.apply(&v("1.2.3-rc")).unwrap(), v("1.2.3-rc.1"));
    }

    #[test]
    fn level_then_prerelease() {
        let spec = BumpSpec::minor().with_prerelease("rc").unwrap();
        assert_eq!(spec.apply(&v("1.2.3")).unwrap(), v("1.3.0-rc.1"));
        // The level step resets the counter before the prerelease step runs.
        assert_eq!(spec.apply(&v("1.3.0-rc.1")).unwrap(), v("1.4.0-rc.1"));
    }

    #[test]
    fn build_metadata_is_kept() {
        assert_eq!(
            BumpSpec::patch().apply(&v("1.0.0+build.5")).unwrap(),
            v("1.0.1+build.5")
        );
    }

    #[test]
    fn identity_bump() {
        let spec = BumpSpec::from_params(None, Some("")).unwrap();
        assert!(spec.is_identity());
        assert_eq!(spec.apply(&v("4.5.6-rc.1")).unwrap(), v("4.5.6-rc.1"));
    }

    #[test]
    fn from_params_parses_levels() {
        let spec = BumpSpec::from_params(Some("MAJOR"), Some("alpha")).unwrap();
        assert_eq!(spec.level_step(), Some(BumpLevel::Major));
        assert_eq!(spec.prerelease_step().unwrap().as_str(), "alpha");
        assert_eq!(spec.to_string(), "major+pre:alpha");

        assert!(matches!(
            BumpSpec::from_params(Some("huge"), None),
            Err(CodecError::UnknownBump(_))
        ));
    }

    #[test]
    fn rejects_bad_prerelease_names() {
        assert!(PrereleaseName::new("").is_err());
        assert!(PrereleaseName::new("rc.1").is_err());
        assert!(PrereleaseName::new("r c").is_err());
        assert!(PrereleaseName::new("rc-beta").is_ok());
    }

    #[test]
    fn overflow_is_an_error() {
        let max = Version::new(1, 2, u64::MAX);
        assert_eq!(
            BumpSpec::patch().apply(&max),
            Err(CodecError::Overflow { component: "patch" })
        );
    }

    fn version_strategy() -> impl Strategy<Value = Version> {
        (
            0u64..1000,
            0u64..1000,
            0u64..1000,
            prop::option::of(("[a-z]{1,6}", 1u64..50)),
        )
            .prop_map(|(major, minor, patch, pre)| {
                let text = match pre {
                    Some((name, n)) => format!("{major}.{minor}.{patch}-{name}.{n}"),
                    None => format!("{major}.{minor}.{patch}"),
                };
                Version::parse(&text).unwrap()
            })
    }

    fn level_strategy() -> impl Strategy<Value = BumpLevel> {
        prop_oneof![
            Just(BumpLevel::Major),
            Just(BumpLevel::Minor),
            Just(BumpLevel::Patch),
        ]
    }

    proptest! {
        #[test]
        fn numeric_bumps_strictly_advance(current in version_strategy(), level in level_strategy()) {
            let next = BumpSpec::level(level).apply(&current).unwrap();
            prop_assert!(next.is_newer_than(&current));
            prop_assert!(!next.is_prerelease());
        }

        #[test]
        fn final_never_regresses(current in version_strategy()) {
            let next = BumpSpec::finalize().apply(&current).unwrap();
            prop_assert!(!current.is_newer_than(&next));
            prop_assert!(!next.is_prerelease());
        }

        #[test]
        fn same_name_prerelease_advances(current in version_strategy(), name in "[a-z]{1,6}") {
            let spec = BumpSpec::prerelease(&name).unwrap();
            let first = spec.apply(&current).unwrap();
            let second = spec.apply(&first).unwrap();
            prop_assert!(second.is_newer_than(&first));
        }
    }
}
