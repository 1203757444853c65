//! # semslot Git
//!
//! Git-backed [`RemoteStore`](semslot_engine::RemoteStore) for semslot.
//!
//! The slot is a one-line file on a branch. A push is the compare-and-swap:
//! git refuses a non-fast-forward update, so two writers racing from the same
//! tip cannot both succeed.
//!
//! This crate provides:
//! - [`GitStore`]: clone / fetch / reset, read, and commit + push
//! - [`SshKeyProvisioner`]: writes the deploy key used for ssh transport
//! - Output classification of `git commit` and `git push`
//! - [`GitRunner`] with a process-backed and a scripted implementation
//!
//! ## Example
//!
//! ```no_run
//! use semslot_codec::{BumpSpec, Version};
//! use semslot_engine::{SlotConfig, SlotController};
//! use semslot_git::{GitConfig, GitStore, SshKeyProvisioner};
//! use std::path::Path;
//!
//! let base = Path::new("/tmp/semslot");
//! let key_path = GitConfig::default_key_path(base);
//! let git = GitConfig::in_dir("git@example.com:org/versions.git", base)
//!     .with_branch("version")
//!     .with_key_path(&key_path);
//!
//! let store = GitStore::open(git)?;
//! let controller = SlotController::new(
//!     SlotConfig::new("version"),
//!     store,
//!     SshKeyProvisioner::new(key_path),
//! )?;
//! let version = controller.bump(&BumpSpec::minor(), &Version::new(0, 0, 0))?;
//! println!("{version}");
//! # Ok::<(), semslot_engine::SlotError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod classify;
mod config;
mod key;
mod runner;
mod store;

pub use classify::{
    classify_commit, classify_push, CommitClass, NOTHING_TO_COMMIT, PUSH_CONFLICT_MARKERS,
    PUSH_REFUSAL_MARKERS,
};
pub use config::{CommitAuthor, GitConfig, KEY_FILE_NAME, REPLICA_DIR_NAME};
pub use key::SshKeyProvisioner;
pub use runner::{GitError, GitOutput, GitRunner, Invocation, ProcessRunner, ScriptedRunner};
pub use store::GitStore;
