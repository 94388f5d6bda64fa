// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target store.

use crate::error::StoreError;
use crate::handle::StorageHandle;
use arx_core::clock::Clock;
use arx_core::target::{Target, TargetId, TargetKind};
use tracing::info;

/// CRUD for targets. Name uniqueness among non-deleted targets is
/// enforced here; soft-deleting a target cascades to its asset rows.
#[derive(Clone)]
pub struct TargetStore<C: Clock> {
    handle: StorageHandle,
    clock: C,
}

impl<C: Clock> TargetStore<C> {
    pub fn new(handle: StorageHandle, clock: C) -> Self {
        Self { handle, clock }
    }

    /// Create a target. Fails with `DuplicateKey` when a live target with
    /// the same name exists.
    pub fn create(
        &self,
        id: TargetId,
        name: &str,
        kind: TargetKind,
    ) -> Result<Target, StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            let clash = tables
                .targets
                .values()
                .any(|t| !t.is_deleted() && t.name == name);
            if clash {
                return Err(StoreError::DuplicateKey(format!("target name {name:?}")));
            }
            if tables.targets.contains_key(&id) {
                return Err(StoreError::DuplicateKey(format!("target id {id}")));
            }
            let target = Target::new(id.clone(), name, kind, now);
            tables.targets.insert(id, target.clone());
            Ok(target)
        })
    }

    /// Fetch a live target.
    pub fn get(&self, id: &TargetId) -> Result<Target, StoreError> {
        self.handle.run(|tables| {
            tables
                .targets
                .get(id)
                .filter(|t| !t.is_deleted())
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("target {id}")))
        })
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Target>, StoreError> {
        self.handle.run(|tables| {
            Ok(tables
                .targets
                .values()
                .find(|t| !t.is_deleted() && t.name == name)
                .cloned())
        })
    }

    pub fn update_last_scanned(&self, id: &TargetId) -> Result<(), StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            let target = tables
                .targets
                .get_mut(id)
                .filter(|t| !t.is_deleted())
                .ok_or_else(|| StoreError::NotFound(format!("target {id}")))?;
            target.last_scanned_at_ms = Some(now);
            Ok(())
        })
    }

    /// Soft-delete a target and drop its asset rows from the live tables.
    pub fn soft_delete(&self, id: &TargetId) -> Result<(), StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            let target = tables
                .targets
                .get_mut(id)
                .filter(|t| !t.is_deleted())
                .ok_or_else(|| StoreError::NotFound(format!("target {id}")))?;
            target.deleted_at_ms = Some(now);

            tables.subdomains.retain(|(t, _), _| t != id);
            tables.host_ports.retain(|(t, _, _, _), _| t != id);
            tables.websites.retain(|(t, _), _| t != id);
            tables.endpoints.retain(|(t, _), _| t != id);
            tables.directories.retain(|(t, _), _| t != id);
            tables.vulnerabilities.retain(|(t, _, _, _), _| t != id);

            info!(target_id = %id, "target soft-deleted, asset rows dropped");
            Ok(())
        })
    }

    /// Whether the target exists and is not soft-deleted.
    pub fn is_live(&self, id: &TargetId) -> Result<bool, StoreError> {
        self.handle.run(|tables| {
            Ok(tables
                .targets
                .get(id)
                .map(|t| !t.is_deleted())
                .unwrap_or(false))
        })
    }
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod tests;
