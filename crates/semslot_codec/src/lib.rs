//! # semslot Codec
//!
//! Semantic version parsing, formatting and bump rules for semslot.
//!
//! This crate is pure: no I/O, no state. It provides:
//! - [`Version`], ordered by semver precedence
//! - [`BumpSpec`], a level step and/or a prerelease step
//! - The persisted line format (`<version>\n`)
//!
//! ## Usage
//!
//! ```
//! use semslot_codec::{BumpSpec, Version};
//!
//! let current = Version::parse("1.2.3\n").unwrap();
//! let bump = BumpSpec::from_params(Some("minor"), Some("rc")).unwrap();
//! let next = bump.apply(&current).unwrap();
//! assert_eq!(next.to_string(), "1.3.0-rc.1");
//! assert!(next.is_newer_than(&current));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bump;
mod error;
mod version;

pub use bump::{BumpLevel, BumpSpec, PrereleaseName};
pub use error::{CodecError, CodecResult};
pub use version::Version;
