//! CLI command implementations.

pub mod bump;
pub mod check;
pub mod set;

use crate::config::Settings;
use crate::error::CliResult;
use semslot_codec::Version;
use semslot_engine::SlotController;
use semslot_git::{GitStore, SshKeyProvisioner};
use serde::Serialize;

/// Controller over the configured git repository.
pub type GitController = SlotController<GitStore, SshKeyProvisioner>;

/// A version as printed on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRef {
    /// Canonical version string.
    pub number: String,
}

impl From<&Version> for VersionRef {
    fn from(version: &Version) -> Self {
        Self {
            number: version.to_string(),
        }
    }
}

/// Output of commands that write the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionOutput {
    /// The version the slot now holds.
    pub version: VersionRef,
}

impl From<&Version> for VersionOutput {
    fn from(version: &Version) -> Self {
        Self {
            version: version.into(),
        }
    }
}

/// Opens a controller for the resolved settings.
pub fn open(settings: &Settings) -> CliResult<GitController> {
    let store = GitStore::open(settings.git_config())?;
    let provisioner = SshKeyProvisioner::new(settings.key_path());
    Ok(SlotController::new(
        settings.slot_config(),
        store,
        provisioner,
    )?)
}

/// Prints `value` as one line of JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
