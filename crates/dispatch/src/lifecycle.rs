// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan lifecycle: creation, stop, two-phase delete.

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::runtime::ScanRuntime;
use arx_config::merge_engine_configs;
use arx_core::clock::Clock;
use arx_core::scan::{Scan, ScanCounts, ScanId, ScanMode, ScanStatus};
use arx_core::target::TargetId;
use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ScanLifecycle<C: Clock> {
    scans: arx_storage::ScanStore<C>,
    targets: arx_storage::TargetStore<C>,
    dispatcher: Arc<Dispatcher<C>>,
    runtime: Arc<ScanRuntime>,
    clock: C,
    /// Base directory for per-scan results directories.
    results_base: PathBuf,
}

impl<C: Clock> ScanLifecycle<C> {
    pub fn new(
        scans: arx_storage::ScanStore<C>,
        targets: arx_storage::TargetStore<C>,
        dispatcher: Arc<Dispatcher<C>>,
        runtime: Arc<ScanRuntime>,
        clock: C,
        results_base: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scans,
            targets,
            dispatcher,
            runtime,
            clock,
            results_base: results_base.into(),
        }
    }

    /// `{base}/scan_{YYYYmmdd_HHMMSS}_{uuid8}`; the uuid suffix keeps
    /// two scans created within one second apart.
    fn generate_results_dir(&self, base: &Path) -> PathBuf {
        let now_ms = self.clock.epoch_ms();
        let stamp = Utc
            .timestamp_millis_opt(now_ms as i64)
            .single()
            .map(|dt| dt.format("%Y%m%d_%H%M%S").to_string())
            .unwrap_or_else(|| now_ms.to_string());
        let unique = uuid::Uuid::new_v4().simple().to_string();
        base.join(format!("scan_{stamp}_{}", &unique[..8]))
    }

    /// Create one scan row per target and dispatch them from a detached
    /// background task. Returns the created rows immediately.
    pub fn create_scans(
        &self,
        target_ids: &[TargetId],
        engine_ids: Vec<String>,
        engine_names: Vec<String>,
        engine_configs: &[String],
        mode: ScanMode,
    ) -> Result<Vec<Scan>, DispatchError> {
        let (config_text, _) = merge_engine_configs(engine_configs)?;

        let mut created = Vec::with_capacity(target_ids.len());
        for target_id in target_ids {
            let target = self.targets.get(target_id)?;
            let scan = Scan {
                id: ScanId::new(uuid::Uuid::new_v4().to_string()),
                target_id: target.id.clone(),
                engine_ids: engine_ids.clone(),
                engine_names: engine_names.clone(),
                config_text: config_text.clone(),
                mode,
                status: ScanStatus::Initiated,
                created_at_ms: self.clock.epoch_ms(),
                stopped_at_ms: None,
                worker_id: None,
                results_dir: self.generate_results_dir(&self.results_base),
                container_ids: Vec::new(),
                error_message: String::new(),
                progress: 0,
                current_stage: String::new(),
                stage_progress: Vec::new(),
                counts: ScanCounts::default(),
                stats_updated_at_ms: None,
                deleted_at_ms: None,
            };
            self.scans.create(scan.clone())?;
            info!(scan_id = %scan.id, target = %target.name, mode = %mode, "scan created");
            created.push(scan);
        }

        // Dispatch off the request path.
        let dispatcher = self.dispatcher.clone();
        let rows = created.clone();
        tokio::spawn(async move {
            for scan in rows {
                let outcome = dispatcher.dispatch(&scan).await;
                if !outcome.ok {
                    warn!(scan_id = %scan.id, message = %outcome.message, "dispatch failed");
                }
            }
        });

        Ok(created)
    }

    /// Request cancellation and transition to CANCELLED. Only INITIATED
    /// and RUNNING scans can be stopped.
    pub fn stop_scan(&self, scan_id: &ScanId) -> Result<Scan, DispatchError> {
        let scan = self.scans.get(scan_id)?;
        if !matches!(scan.status, ScanStatus::Initiated | ScanStatus::Running) {
            return Err(DispatchError::NotStoppable {
                scan_id: scan_id.to_string(),
                status: scan.status.to_string(),
            });
        }

        // Cooperative teardown: the orchestrator stops at the next stage
        // boundary; running tools die with their process trees.
        let was_local = self.runtime.cancel(scan_id);
        if !was_local {
            info!(scan_id = %scan_id, "no local run to cancel (finished or remote)");
        }

        let stopped = self.scans.update_status(scan_id, ScanStatus::Cancelled)?;
        info!(scan_id = %scan_id, "scan cancelled");
        Ok(stopped)
    }

    /// Two-phase delete: soft-delete now (rows vanish from reads), hard
    /// delete rows plus the on-disk results directory in the background.
    pub fn delete_scans(&self, scan_ids: &[ScanId]) -> Result<usize, DispatchError> {
        let mut deleted = Vec::new();
        for scan_id in scan_ids {
            match self.scans.soft_delete(scan_id) {
                Ok(scan) => deleted.push(scan),
                Err(err) => warn!(scan_id = %scan_id, error = %err, "soft delete failed"),
            }
        }
        let count = deleted.len();

        let scans = self.scans.clone();
        tokio::spawn(async move {
            for scan in deleted {
                if scan.results_dir.is_dir() {
                    if let Err(err) = tokio::fs::remove_dir_all(&scan.results_dir).await {
                        warn!(
                            scan_id = %scan.id,
                            dir = %scan.results_dir.display(),
                            error = %err,
                            "results directory removal failed"
                        );
                    }
                }
                if let Err(err) = scans.hard_delete(&scan.id) {
                    warn!(scan_id = %scan.id, error = %err, "hard delete failed");
                }
            }
        });

        Ok(count)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
