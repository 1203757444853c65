//! Check command implementation.

use super::{print_json, VersionRef};
use crate::error::CliResult;
use semslot_codec::Version;
use semslot_engine::{KeyProvisioner, RemoteStore, SlotController};

/// Lists versions newer than `cursor`.
pub fn execute<S: RemoteStore, K: KeyProvisioner>(
    controller: &SlotController<S, K>,
    cursor: Option<&str>,
) -> CliResult<Vec<VersionRef>> {
    let cursor = cursor.map(Version::parse).transpose()?;
    let versions = controller.check(cursor.as_ref())?;
    Ok(versions.iter().map(VersionRef::from).collect())
}

/// Runs the check command.
pub fn run<S: RemoteStore, K: KeyProvisioner>(
    controller: &SlotController<S, K>,
    cursor: Option<&str>,
) -> CliResult<()> {
    print_json(&execute(controller, cursor)?)
}
