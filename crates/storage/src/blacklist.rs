// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blacklist rule store.
//!
//! Rules are validated (glob/regex compiled) before they are accepted, so
//! a provider loading them later cannot hit a compile failure and
//! silently scan something the operator excluded.

use crate::error::StoreError;
use crate::handle::StorageHandle;
use arx_core::blacklist::{BlacklistFilter, BlacklistRule};
use arx_core::target::TargetId;

#[derive(Clone)]
pub struct BlacklistStore {
    handle: StorageHandle,
}

impl BlacklistStore {
    pub fn new(handle: StorageHandle) -> Self {
        Self { handle }
    }

    fn validate(rules: &[BlacklistRule]) -> Result<(), StoreError> {
        BlacklistFilter::new(rules)
            .map(|_| ())
            .map_err(|e| StoreError::Invalid(e.to_string()))
    }

    pub fn set_global_rules(&self, rules: Vec<BlacklistRule>) -> Result<(), StoreError> {
        Self::validate(&rules)?;
        self.handle.run(|tables| {
            tables.global_blacklist = rules;
            Ok(())
        })
    }

    pub fn set_target_rules(
        &self,
        target_id: &TargetId,
        rules: Vec<BlacklistRule>,
    ) -> Result<(), StoreError> {
        Self::validate(&rules)?;
        self.handle.run(|tables| {
            tables.target_blacklist.insert(target_id.clone(), rules);
            Ok(())
        })
    }

    /// The global rules plus the target's own, in that order.
    pub fn rules_for(&self, target_id: &TargetId) -> Result<Vec<BlacklistRule>, StoreError> {
        self.handle.run(|tables| {
            let mut rules = tables.global_blacklist.clone();
            if let Some(own) = tables.target_blacklist.get(target_id) {
                rules.extend(own.iter().cloned());
            }
            Ok(rules)
        })
    }
}

#[cfg(test)]
#[path = "blacklist_tests.rs"]
mod tests;
