//! Set command implementation.

use super::{print_json, VersionOutput};
use crate::error::CliResult;
use semslot_codec::Version;
use semslot_engine::{KeyProvisioner, RemoteStore, SlotController};

/// Sets the slot to exactly `version`.
pub fn execute<S: RemoteStore, K: KeyProvisioner>(
    controller: &SlotController<S, K>,
    version: &str,
) -> CliResult<VersionOutput> {
    let target = Version::parse(version)?;
    controller.set_exact(&target)?;
    Ok(VersionOutput::from(&target))
}

/// Runs the set command.
pub fn run<S: RemoteStore, K: KeyProvisioner>(
    controller: &SlotController<S, K>,
    version: &str,
) -> CliResult<()> {
    print_json(&execute(controller, version)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::controller;
    use semslot_engine::MemoryRemote;
    use std::sync::Arc;

    #[test]
    fn sets_exact_value_even_if_lower() {
        let remote = Arc::new(MemoryRemote::with_file("version", "3.0.0\n"));
        let ctl = controller(&remote);

        let out = execute(&ctl, "2.5.0-beta.1").unwrap();
        assert_eq!(out.version.number, "2.5.0-beta.1");
        assert_eq!(remote.file("version").as_deref(), Some("2.5.0-beta.1\n"));

        // Same value again is accepted without a new commit.
        let commits = remote.history().len();
        execute(&ctl, "2.5.0-beta.1").unwrap();
        assert_eq!(remote.history().len(), commits);
    }
}
