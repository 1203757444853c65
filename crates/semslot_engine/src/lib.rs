//! # semslot Engine
//!
//! Optimistic concurrency control for a single version number stored in a
//! remote repository.
//!
//! This crate provides:
//! - The slot controller state machine (provisioning → syncing → reading →
//!   writing → retrying → done / failed)
//! - `bump`, `set_exact` and `check` operations
//! - The [`RemoteStore`] and [`KeyProvisioner`] seams
//! - In-memory and scripted stores for testing
//!
//! ## Protocol
//!
//! Each write operation is a read-modify-write cycle:
//! 1. Sync the replica to the remote tip
//! 2. Read the current version (or the initial version if absent)
//! 3. Compute the desired version
//! 4. Propose it; the remote accepts or rejects atomically
//!
//! A rejected proposal restarts the cycle from step 1.
//!
//! ## Key Invariants
//!
//! - Success is only reported after the store confirms the write
//! - Every retry recomputes from freshly synced state
//! - Conflicts are never surfaced to callers
//! - Failures are never retried
//!
//! ## Example
//!
//! ```
//! use semslot_codec::{BumpSpec, Version};
//! use semslot_engine::{MemoryRemote, MemoryStore, NoKeyProvisioner, SlotConfig, SlotController};
//! use std::sync::Arc;
//!
//! let remote = Arc::new(MemoryRemote::new());
//! let store = MemoryStore::new(Arc::clone(&remote));
//! let controller =
//!     SlotController::new(SlotConfig::new("version"), store, NoKeyProvisioner).unwrap();
//!
//! let written = controller.bump(&BumpSpec::patch(), &Version::new(0, 0, 0)).unwrap();
//! assert_eq!(written.to_string(), "0.0.1");
//! assert_eq!(remote.file("version").as_deref(), Some("0.0.1\n"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod config;
mod controller;
mod error;
mod memory;
mod mock;
mod store;

pub use config::{SecretKey, SlotConfig, VERSION_PLACEHOLDER};
pub use controller::{
    AttemptReport, ControllerState, ControllerStats, SlotController, WriteDisposition,
};
pub use error::{SlotError, SlotResult};
pub use memory::{CommitRecord, MemoryRemote, MemoryStore};
pub use mock::{MockCall, MockProvisioner, MockStore};
pub use store::{
    is_encrypted_key, KeyProvisioner, NoKeyProvisioner, RemoteStore, SyncKind, WriteOutcome,
    ENCRYPTED_KEY_MARKER,
};
