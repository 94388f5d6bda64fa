// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker heartbeat store: a TTL'd key-value table.
//!
//! Workers post `(cpu_percent, memory_percent)` periodically; the
//! dispatcher reads live entries on every dispatch. An entry older than
//! [`HEARTBEAT_TTL_MS`] is invisible, which is how a worker goes offline.

use crate::error::StoreError;
use crate::handle::StorageHandle;
use crate::tables::HeartbeatEntry;
use arx_core::clock::Clock;
use arx_core::worker::{WorkerId, WorkerLoad};

/// Heartbeats expire after 60 seconds.
pub const HEARTBEAT_TTL_MS: u64 = 60_000;

#[derive(Clone)]
pub struct HeartbeatStore<C: Clock> {
    handle: StorageHandle,
    clock: C,
}

impl<C: Clock> HeartbeatStore<C> {
    pub fn new(handle: StorageHandle, clock: C) -> Self {
        Self { handle, clock }
    }

    /// Record a heartbeat, refreshing the TTL. Returns true when this is
    /// the worker's first live heartbeat (used to flip it online).
    pub fn record(&self, worker_id: &WorkerId, load: WorkerLoad) -> Result<bool, StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            let was_live = tables
                .heartbeats
                .get(worker_id)
                .map(|e| e.expires_at_ms > now)
                .unwrap_or(false);
            tables.heartbeats.insert(
                worker_id.clone(),
                HeartbeatEntry {
                    load,
                    expires_at_ms: now + HEARTBEAT_TTL_MS,
                },
            );
            Ok(!was_live)
        })
    }

    /// The worker's current load, or None when its heartbeat expired.
    pub fn load(&self, worker_id: &WorkerId) -> Result<Option<WorkerLoad>, StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            Ok(tables
                .heartbeats
                .get(worker_id)
                .filter(|e| e.expires_at_ms > now)
                .map(|e| e.load))
        })
    }

    /// All workers with a live heartbeat. Expired entries are pruned.
    pub fn live_loads(&self) -> Result<Vec<(WorkerId, WorkerLoad)>, StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            tables.heartbeats.retain(|_, e| e.expires_at_ms > now);
            Ok(tables
                .heartbeats
                .iter()
                .map(|(id, e)| (id.clone(), e.load))
                .collect())
        })
    }

    pub fn remove(&self, worker_id: &WorkerId) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            tables.heartbeats.remove(worker_id);
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
