//! Bump command implementation.

use super::{print_json, VersionOutput};
use crate::error::CliResult;
use semslot_codec::BumpSpec;
use semslot_engine::{KeyProvisioner, RemoteStore, SlotController};
use tracing::info;

/// Bumps the slot by `bump` (`major|minor|patch|final`) and `pre`.
pub fn execute<S: RemoteStore, K: KeyProvisioner>(
    controller: &SlotController<S, K>,
    bump: Option<&str>,
    pre: Option<&str>,
) -> CliResult<VersionOutput> {
    let spec = BumpSpec::from_params(bump, pre)?;
    let report = controller.bump_with_report(&spec, &controller.config().initial_version)?;
    info!(
        bump = %spec,
        version = %report.version,
        attempts = report.attempts,
        "bumped"
    );
    Ok(VersionOutput::from(&report.version))
}

/// Runs the bump command.
pub fn run<S: RemoteStore, K: KeyProvisioner>(
    controller: &SlotController<S, K>,
    bump: Option<&str>,
    pre: Option<&str>,
) -> CliResult<()> {
    print_json(&execute(controller, bump, pre)?)
}
