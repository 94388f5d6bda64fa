// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Load-aware worker dispatch.

use crate::error::DispatchError;
use crate::invoker::WorkerInvoker;
use arx_core::clock::Clock;
use arx_core::scan::{Scan, ScanStatus};
use arx_core::worker::{Worker, WorkerId};
use arx_engine::ScanRequest;
use arx_storage::{HeartbeatStore, ScanStore, WorkerStore};
use std::sync::Arc;
use tracing::{info, warn};

/// What `dispatch` reports back to the lifecycle layer.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub ok: bool,
    pub message: String,
    pub container_id: Option<String>,
    pub worker_id: Option<WorkerId>,
}

pub struct Dispatcher<C: Clock> {
    workers: WorkerStore,
    heartbeats: HeartbeatStore<C>,
    scans: ScanStore<C>,
    invoker: Arc<dyn WorkerInvoker>,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(
        workers: WorkerStore,
        heartbeats: HeartbeatStore<C>,
        scans: ScanStore<C>,
        invoker: Arc<dyn WorkerInvoker>,
    ) -> Self {
        Self {
            workers,
            heartbeats,
            scans,
            invoker,
        }
    }

    /// The least-loaded worker with a live heartbeat. A worker without a
    /// heartbeat is offline no matter what its status row says.
    fn pick_worker(&self) -> Result<Option<Worker>, DispatchError> {
        let mut loads = self.heartbeats.live_loads()?;
        loads.sort_by(|a, b| a.1.score().total_cmp(&b.1.score()));
        for (worker_id, load) in loads {
            match self.workers.get(&worker_id) {
                Ok(worker) => {
                    info!(
                        worker = %worker.name,
                        cpu = load.cpu_percent,
                        memory = load.memory_percent,
                        "selected worker"
                    );
                    return Ok(Some(worker));
                }
                Err(_) => {
                    warn!(worker_id = %worker_id, "heartbeat for unknown worker, ignoring");
                }
            }
        }
        Ok(None)
    }

    /// Place one scan on a worker. On failure the scan goes straight to
    /// FAILED; it never touches RUNNING.
    pub async fn dispatch(&self, scan: &Scan) -> DispatchOutcome {
        let worker = match self.pick_worker() {
            Ok(Some(worker)) => worker,
            Ok(None) => {
                return self.fail_scan(scan, "no online workers available");
            }
            Err(err) => {
                return self.fail_scan(scan, &format!("worker lookup failed: {err}"));
            }
        };

        let request = ScanRequest {
            scan_id: scan.id.clone(),
            target_id: scan.target_id.clone(),
            workspace: scan.results_dir.clone(),
            engine_name: scan.engine_names.join(", "),
        };

        match self.invoker.execute_scan_flow(&worker, request).await {
            Ok(receipt) => {
                let mut message = "scan dispatched".to_string();
                if let Err(err) = self
                    .scans
                    .append_container_id(&scan.id, &receipt.container_id)
                {
                    warn!(scan_id = %scan.id, error = %err, "could not record container id");
                    message = format!("dispatched, container id not recorded: {err}");
                }
                if let Err(err) = self.scans.set_worker(&scan.id, &worker.id) {
                    warn!(scan_id = %scan.id, error = %err, "could not record worker id");
                }
                DispatchOutcome {
                    ok: true,
                    message,
                    container_id: Some(receipt.container_id),
                    worker_id: Some(worker.id),
                }
            }
            Err(err) => self.fail_scan(scan, &format!("invocation failed: {err}")),
        }
    }

    fn fail_scan(&self, scan: &Scan, message: &str) -> DispatchOutcome {
        warn!(scan_id = %scan.id, message, "dispatch failed");
        if let Err(err) = self.scans.set_error_message(&scan.id, message) {
            warn!(scan_id = %scan.id, error = %err, "could not record error message");
        }
        if let Err(err) = self.scans.update_status(&scan.id, ScanStatus::Failed) {
            warn!(scan_id = %scan.id, error = %err, "could not mark scan failed");
        }
        DispatchOutcome {
            ok: false,
            message: message.to_string(),
            container_id: None,
            worker_id: None,
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
