// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker registry.

use crate::error::StoreError;
use crate::handle::StorageHandle;
use arx_core::worker::{Worker, WorkerId, WorkerStatus};

#[derive(Clone)]
pub struct WorkerStore {
    handle: StorageHandle,
}

impl WorkerStore {
    pub fn new(handle: StorageHandle) -> Self {
        Self { handle }
    }

    /// Register a worker by name. Re-registering an existing name returns
    /// the stored record, so local workers can self-register on startup.
    pub fn register(
        &self,
        id: WorkerId,
        name: &str,
        is_local: bool,
    ) -> Result<(Worker, bool), StoreError> {
        self.handle.run(|tables| {
            if let Some(existing) = tables.workers.values().find(|w| w.name == name) {
                return Ok((existing.clone(), false));
            }
            let worker = Worker::new(id.clone(), name, is_local);
            tables.workers.insert(id, worker.clone());
            Ok((worker, true))
        })
    }

    pub fn get(&self, id: &WorkerId) -> Result<Worker, StoreError> {
        self.handle.run(|tables| {
            tables
                .workers
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("worker {id}")))
        })
    }

    pub fn list(&self) -> Result<Vec<Worker>, StoreError> {
        self.handle
            .run(|tables| Ok(tables.workers.values().cloned().collect()))
    }

    pub fn set_status(&self, id: &WorkerId, status: WorkerStatus) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            let worker = tables
                .workers
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("worker {id}")))?;
            worker.status = status;
            Ok(())
        })
    }
}
