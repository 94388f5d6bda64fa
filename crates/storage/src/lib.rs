// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! arx-storage: Stores for targets, assets, snapshots, scans, and worker
//! heartbeats, all behind a shared reconnecting [`StorageHandle`].
//!
//! The backing tables are in-memory and keyed by natural keys; uniqueness
//! and upsert-merge semantics are enforced here, the way the relational
//! layer would enforce them with constraints.

pub mod assets;
pub mod blacklist;
pub mod error;
pub mod handle;
pub mod heartbeat;
pub mod iter;
pub mod scans;
pub mod snapshots;
mod tables;
pub mod targets;
pub mod workers;

pub use assets::{AssetCounts, AssetStore, MergeMode};
pub use blacklist::BlacklistStore;
pub use error::StoreError;
pub use handle::StorageHandle;
pub use heartbeat::{HeartbeatStore, HEARTBEAT_TTL_MS};
pub use iter::RowIter;
pub use scans::ScanStore;
pub use snapshots::{SnapshotCounts, SnapshotStore};
pub use targets::TargetStore;
pub use workers::WorkerStore;
