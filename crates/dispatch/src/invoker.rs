// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker invocation.
//!
//! The dispatch mechanism is opaque behind [`WorkerInvoker`]: the
//! in-tree [`LocalInvoker`] spawns the orchestrator on a background
//! task; a remote implementation would ship the same request over SSH
//! or a queue. Either way the invoker returns a container id
//! immediately and the scan runs detached.

use crate::error::DispatchError;
use crate::runtime::ScanRuntime;
use arx_core::cancel::CancelFlag;
use arx_core::clock::Clock;
use arx_core::scan::ScanStatus;
use arx_core::worker::Worker;
use arx_engine::{Orchestrator, ScanRequest};
use arx_storage::ScanStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

/// What a successful invocation hands back.
#[derive(Debug, Clone)]
pub struct InvokeReceipt {
    pub container_id: String,
}

#[async_trait]
pub trait WorkerInvoker: Send + Sync {
    /// Start the scan flow on the given worker. Returns once the run is
    /// placed, not once it finishes.
    async fn execute_scan_flow(
        &self,
        worker: &Worker,
        request: ScanRequest,
    ) -> Result<InvokeReceipt, DispatchError>;
}

/// Runs scans in-process on a detached task.
pub struct LocalInvoker<C: Clock> {
    orchestrator: Arc<Orchestrator<C>>,
    scans: ScanStore<C>,
    runtime: Arc<ScanRuntime>,
}

impl<C: Clock> LocalInvoker<C> {
    pub fn new(
        orchestrator: Arc<Orchestrator<C>>,
        scans: ScanStore<C>,
        runtime: Arc<ScanRuntime>,
    ) -> Self {
        Self {
            orchestrator,
            scans,
            runtime,
        }
    }
}

#[async_trait]
impl<C: Clock> WorkerInvoker for LocalInvoker<C> {
    async fn execute_scan_flow(
        &self,
        worker: &Worker,
        request: ScanRequest,
    ) -> Result<InvokeReceipt, DispatchError> {
        let container_id = uuid::Uuid::new_v4().simple().to_string();
        let cancel = CancelFlag::new();
        self.runtime.register(request.scan_id.clone(), cancel.clone());

        info!(
            scan_id = %request.scan_id,
            worker = %worker.name,
            container_id = %container_id,
            "placing scan on local worker"
        );

        let orchestrator = self.orchestrator.clone();
        let scans = self.scans.clone();
        let runtime = self.runtime.clone();
        let scan_id = request.scan_id.clone();
        tokio::spawn(async move {
            let result = orchestrator.execute_scan(request, cancel).await;
            runtime.remove(&scan_id);
            match result {
                Ok(summary) if summary.cancelled => {
                    info!(scan_id = %scan_id, "scan run ended after cancellation");
                }
                Ok(_) => {}
                Err(err) => {
                    error!(scan_id = %scan_id, error = %err, "scan flow failed");
                    let _ = scans.set_error_message(&scan_id, &err.to_string());
                    if let Err(status_err) = scans.update_status(&scan_id, ScanStatus::Failed) {
                        error!(scan_id = %scan_id, error = %status_err, "could not mark scan failed");
                    }
                }
            }
        });

        Ok(InvokeReceipt { container_id })
    }
}

/// Scripted invoker for tests: records requests and optionally fails.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeInvoker {
    pub requests: parking_lot::Mutex<Vec<ScanRequest>>,
    pub fail_with: parking_lot::Mutex<Option<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeInvoker {
    fn default() -> Self {
        Self {
            requests: parking_lot::Mutex::new(Vec::new()),
            fail_with: parking_lot::Mutex::new(None),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeInvoker {
    pub fn failing(message: &str) -> Self {
        let invoker = Self::default();
        *invoker.fail_with.lock() = Some(message.to_string());
        invoker
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl WorkerInvoker for FakeInvoker {
    async fn execute_scan_flow(
        &self,
        _worker: &Worker,
        request: ScanRequest,
    ) -> Result<InvokeReceipt, DispatchError> {
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(DispatchError::Invoke(message));
        }
        self.requests.lock().push(request);
        Ok(InvokeReceipt {
            container_id: "fake-container".to_string(),
        })
    }
}
