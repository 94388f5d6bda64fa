// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker heartbeat intake.

use crate::error::DispatchError;
use arx_core::clock::Clock;
use arx_core::worker::{WorkerId, WorkerLoad, WorkerStatus};
use arx_storage::{HeartbeatStore, WorkerStore};
use tracing::info;

pub struct HeartbeatService<C: Clock> {
    workers: WorkerStore,
    heartbeats: HeartbeatStore<C>,
}

impl<C: Clock> HeartbeatService<C> {
    pub fn new(workers: WorkerStore, heartbeats: HeartbeatStore<C>) -> Self {
        Self { workers, heartbeats }
    }

    /// Record one heartbeat. The first heartbeat after registration (or
    /// after a TTL expiry) flips the worker online.
    pub fn record(&self, worker_id: &WorkerId, load: WorkerLoad) -> Result<(), DispatchError> {
        // Reject heartbeats from unregistered workers.
        let worker = self.workers.get(worker_id)?;
        let first = self.heartbeats.record(worker_id, load)?;
        if first && worker.status != WorkerStatus::Online {
            info!(worker = %worker.name, "first heartbeat, worker online");
            self.workers.set_status(worker_id, WorkerStatus::Online)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
