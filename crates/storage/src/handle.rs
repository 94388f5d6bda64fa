// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared storage handle with transparent reconnection.
//!
//! Every store call funnels through [`StorageHandle::run`]. When a prior
//! operation left the connection poisoned (a transient failure), `run`
//! re-establishes it before executing the closure, so callers never manage
//! connection state themselves.

use crate::error::StoreError;
use crate::tables::Tables;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

struct Connection {
    tables: Tables,
    healthy: bool,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FaultPlan {
    /// Errors returned by upcoming `run` calls, front first.
    queued: std::collections::VecDeque<StoreError>,
}

struct Inner {
    conn: Mutex<Connection>,
    #[cfg(any(test, feature = "test-support"))]
    faults: Mutex<FaultPlan>,
}

/// Cloneable handle to the shared store.
#[derive(Clone)]
pub struct StorageHandle {
    inner: Arc<Inner>,
}

impl StorageHandle {
    /// Open a fresh, empty store.
    pub fn connect() -> Self {
        Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(Connection {
                    tables: Tables::default(),
                    healthy: true,
                }),
                #[cfg(any(test, feature = "test-support"))]
                faults: Mutex::new(FaultPlan::default()),
            }),
        }
    }

    /// Execute `op` against the tables, reconnecting first if the previous
    /// operation failed transiently.
    pub(crate) fn run<T>(
        &self,
        op: impl FnOnce(&mut Tables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        #[cfg(any(test, feature = "test-support"))]
        if let Some(err) = self.inner.faults.lock().queued.pop_front() {
            let mut conn = self.inner.conn.lock();
            if err.is_transient() {
                conn.healthy = false;
            }
            return Err(err);
        }

        let mut conn = self.inner.conn.lock();
        if !conn.healthy {
            debug!("reconnecting storage backend");
            conn.healthy = true;
        }
        op(&mut conn.tables)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl StorageHandle {
    /// Queue `n` transient failures for upcoming operations.
    pub fn inject_transient(&self, n: usize) {
        let mut faults = self.inner.faults.lock();
        for _ in 0..n {
            faults
                .queued
                .push_back(StoreError::ConnectionLost("injected".to_string()));
        }
    }

    /// Queue one integrity failure for the next operation.
    pub fn inject_integrity(&self) {
        self.inner
            .faults
            .lock()
            .queued
            .push_back(StoreError::DuplicateKey("injected".to_string()));
    }

    /// Queue an arbitrary error.
    pub fn inject_error(&self, err: StoreError) {
        self.inner.faults.lock().queued.push_back(err);
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
