// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator: drives a scan's stages per the execution plan.
//!
//! Sequential groups run in listed order; parallel groups run on
//! independent tasks and one stage's failure never aborts its siblings.
//! Progress is persisted through an observer after every transition.
//! Cancellation is cooperative: the flag is checked at stage boundaries
//! and the remaining stages are marked cancelled.

use crate::error::EngineError;
use crate::provider::{InventoryProvider, SnapshotProvider, TargetProvider};
use crate::settings::EngineSettings;
use crate::stage::{StageEnv, StageObserver, StageReport};
use crate::stages;
use arx_adapters::LoadProbe;
use arx_config::{parse_engine_config, EngineConfig, ExecMode, ExecutionPlan};
use arx_core::cancel::CancelFlag;
use arx_core::clock::Clock;
use arx_core::scan::{Scan, ScanId, ScanMode, ScanStatus};
use arx_core::stage::{StageKind, StageState};
use arx_core::target::TargetId;
use arx_storage::{
    AssetStore, BlacklistStore, ScanStore, SnapshotStore, StorageHandle, TargetStore,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// All stores, opened against one shared handle.
pub struct Stores<C: Clock> {
    pub targets: TargetStore<C>,
    pub scans: ScanStore<C>,
    pub assets: AssetStore,
    pub snapshots: SnapshotStore,
    pub blacklists: BlacklistStore,
}

impl<C: Clock> Stores<C> {
    pub fn open(handle: StorageHandle, clock: C) -> Self {
        Self {
            targets: TargetStore::new(handle.clone(), clock.clone()),
            scans: ScanStore::new(handle.clone(), clock.clone()),
            assets: AssetStore::new(handle.clone()),
            snapshots: SnapshotStore::new(handle.clone()),
            blacklists: BlacklistStore::new(handle),
        }
    }
}

impl<C: Clock> Clone for Stores<C> {
    fn clone(&self) -> Self {
        Self {
            targets: self.targets.clone(),
            scans: self.scans.clone(),
            assets: self.assets.clone(),
            snapshots: self.snapshots.clone(),
            blacklists: self.blacklists.clone(),
        }
    }
}

/// What the dispatcher hands a worker.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub scan_id: ScanId,
    pub target_id: TargetId,
    pub workspace: PathBuf,
    pub engine_name: String,
}

/// Outcome summary returned to the invoker.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub scan_id: ScanId,
    pub stages: Vec<(StageKind, StageState)>,
    pub cancelled: bool,
}

/// Persists stage transitions and flips the scan RUNNING on the first
/// stage start.
struct ProgressObserver<C: Clock> {
    scans: ScanStore<C>,
    scan_id: ScanId,
    started: AtomicBool,
}

impl<C: Clock> ProgressObserver<C> {
    fn set_stage(&self, stage: StageKind, state: StageState) {
        if let Err(err) = self.scans.set_stage_status(&self.scan_id, stage.as_str(), state) {
            warn!(scan_id = %self.scan_id, stage = %stage, error = %err, "progress update failed");
        }
    }
}

impl<C: Clock> StageObserver for ProgressObserver<C> {
    fn on_stage_start(&self, stage: StageKind) {
        if !self.started.swap(true, Ordering::SeqCst) {
            if let Err(err) = self.scans.update_status(&self.scan_id, ScanStatus::Running) {
                warn!(scan_id = %self.scan_id, error = %err, "could not mark scan running");
            }
        }
        self.set_stage(stage, StageState::Running);
    }

    fn on_stage_complete(&self, stage: StageKind, report: &StageReport) {
        self.set_stage(stage, report.state);
    }

    fn on_stage_fail(&self, stage: StageKind, _error: &str) {
        self.set_stage(stage, StageState::Failed);
    }

    fn on_stage_skip(&self, stage: StageKind, _reason: &str) {
        self.set_stage(stage, StageState::Skipped);
    }
}

/// Dispatch one stage to its implementation.
async fn run_stage<C: Clock>(
    stage: StageKind,
    env: Arc<StageEnv<C>>,
    provider: Arc<dyn TargetProvider>,
    config: Arc<EngineConfig>,
) -> Result<StageReport, EngineError> {
    match stage {
        StageKind::SubdomainDiscovery => match &config.subdomain_discovery {
            Some(section) => {
                stages::subdomain_discovery::run(&env, provider.as_ref(), section).await
            }
            None => Ok(StageReport::skipped(stage, "not configured")),
        },
        StageKind::PortScan => match &config.port_scan {
            Some(section) => stages::port_scan::run(&env, provider.as_ref(), section).await,
            None => Ok(StageReport::skipped(stage, "not configured")),
        },
        StageKind::SiteScan => match &config.site_scan {
            Some(section) => stages::site_scan::run(&env, provider.as_ref(), section).await,
            None => Ok(StageReport::skipped(stage, "not configured")),
        },
        StageKind::UrlFetch => match &config.url_fetch {
            Some(section) => stages::url_fetch::run(&env, provider.as_ref(), section).await,
            None => Ok(StageReport::skipped(stage, "not configured")),
        },
        StageKind::DirectoryScan => match &config.directory_scan {
            Some(section) => stages::directory_scan::run(&env, provider.as_ref(), section).await,
            None => Ok(StageReport::skipped(stage, "not configured")),
        },
        StageKind::FingerprintDetect => match &config.fingerprint_detect {
            Some(section) => {
                stages::fingerprint_detect::run(&env, provider.as_ref(), section).await
            }
            None => Ok(StageReport::skipped(stage, "not configured")),
        },
        StageKind::Screenshot => match &config.screenshot {
            Some(section) => stages::screenshot::run(&env, provider.as_ref(), section).await,
            None => Ok(StageReport::skipped(stage, "not configured")),
        },
        StageKind::VulnScan => match &config.vuln_scan {
            Some(section) => stages::vuln_scan::run(&env, provider.as_ref(), section).await,
            None => Ok(StageReport::skipped(stage, "not configured")),
        },
    }
}

pub struct Orchestrator<C: Clock> {
    stores: Stores<C>,
    settings: EngineSettings,
    probe: Arc<dyn LoadProbe>,
    clock: C,
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(
        stores: Stores<C>,
        settings: EngineSettings,
        probe: Arc<dyn LoadProbe>,
        clock: C,
    ) -> Self {
        Self {
            stores,
            settings,
            probe,
            clock,
        }
    }

    /// Execute the whole scan flow for one scan row.
    ///
    /// Errors escaping this function mean the orchestrator itself failed
    /// (invalid config, unresolvable target); individual stage failures
    /// are recorded in stage progress and do not propagate.
    pub async fn execute_scan(
        &self,
        request: ScanRequest,
        cancel: CancelFlag,
    ) -> Result<ScanSummary, EngineError> {
        let scan = self.stores.scans.get(&request.scan_id)?;
        let config = Arc::new(parse_engine_config(&scan.config_text)?);
        let plan = ExecutionPlan::from_config(&config);

        std::fs::create_dir_all(&request.workspace)?;

        let provider = self.build_provider(&scan);
        let target_name = provider
            .target_name()?
            .ok_or(EngineError::TargetNameUnavailable)?;
        let target_kind = provider
            .target_kind()?
            .ok_or(EngineError::TargetNameUnavailable)?;

        info!(
            scan_id = %request.scan_id,
            target = %target_name,
            engine = %request.engine_name,
            mode = %scan.mode,
            stages = plan.stages().len(),
            "starting scan"
        );

        let stage_names: Vec<String> =
            plan.stages().iter().map(|s| s.as_str().to_string()).collect();
        self.stores
            .scans
            .init_stage_progress(&request.scan_id, &stage_names)?;
        self.stores.targets.update_last_scanned(&request.target_id)?;

        let observer: Arc<dyn StageObserver> = Arc::new(ProgressObserver {
            scans: self.stores.scans.clone(),
            scan_id: request.scan_id.clone(),
            started: AtomicBool::new(false),
        });

        let env = Arc::new(StageEnv {
            scan_id: request.scan_id.clone(),
            target_id: request.target_id.clone(),
            target_name,
            target_kind,
            workspace: request.workspace.clone(),
            settings: self.settings.clone(),
            probe: self.probe.clone(),
            cancel: cancel.clone(),
            scans: self.stores.scans.clone(),
            targets: self.stores.targets.clone(),
            assets: self.stores.assets.clone(),
            snapshots: self.stores.snapshots.clone(),
            clock: self.clock.clone(),
        });

        let mut executed: Vec<(StageKind, StageState)> = Vec::new();
        let mut cancelled = false;

        'groups: for (mode, group) in &plan.groups {
            if cancel.is_cancelled() {
                cancelled = true;
                break 'groups;
            }
            match mode {
                ExecMode::Sequential => {
                    for &stage in group {
                        if cancel.is_cancelled() {
                            cancelled = true;
                            break 'groups;
                        }
                        let state = self
                            .drive_stage(stage, &env, &provider, &config, &observer)
                            .await;
                        executed.push((stage, state));
                    }
                }
                ExecMode::Parallel => {
                    let mut join_set: JoinSet<(StageKind, Result<StageReport, EngineError>)> =
                        JoinSet::new();
                    for &stage in group {
                        observer.on_stage_start(stage);
                        let env = env.clone();
                        let provider = provider.clone();
                        let config = config.clone();
                        join_set.spawn(async move {
                            let result = run_stage(stage, env, provider, config).await;
                            (stage, result)
                        });
                    }
                    while let Some(joined) = join_set.join_next().await {
                        let Ok((stage, result)) = joined else {
                            continue;
                        };
                        let state =
                            self.settle_stage(&request.scan_id, stage, result, &observer);
                        executed.push((stage, state));
                    }
                }
            }
        }

        if cancel.is_cancelled() {
            cancelled = true;
        }
        if cancelled {
            self.mark_pending_cancelled(&request.scan_id);
            info!(scan_id = %request.scan_id, "scan cancelled, remaining stages skipped");
            return Ok(ScanSummary {
                scan_id: request.scan_id,
                stages: executed,
                cancelled: true,
            });
        }

        match self
            .stores
            .scans
            .update_status(&request.scan_id, ScanStatus::Completed)
        {
            Ok(_) => {
                let counts = self.stores.scans.refresh_cached_counts(&request.scan_id)?;
                info!(
                    scan_id = %request.scan_id,
                    subdomains = counts.subdomains,
                    websites = counts.websites,
                    endpoints = counts.endpoints,
                    vulns = counts.vulns_total,
                    "scan completed"
                );
            }
            Err(err) => {
                // A concurrent stop may have already finalized the row.
                warn!(scan_id = %request.scan_id, error = %err, "could not mark completed");
            }
        }

        Ok(ScanSummary {
            scan_id: request.scan_id,
            stages: executed,
            cancelled: false,
        })
    }

    fn build_provider(&self, scan: &Scan) -> Arc<dyn TargetProvider> {
        match scan.mode {
            ScanMode::Quick => {
                info!(scan_id = %scan.id, "quick scan, using snapshot provider");
                Arc::new(SnapshotProvider::new(
                    self.stores.targets.clone(),
                    self.stores.snapshots.clone(),
                    scan.id.clone(),
                    Some(scan.target_id.clone()),
                ))
            }
            ScanMode::Full => Arc::new(InventoryProvider::new(
                self.stores.targets.clone(),
                self.stores.assets.clone(),
                self.stores.blacklists.clone(),
                scan.target_id.clone(),
                Some(scan.id.clone()),
            )),
        }
    }

    async fn drive_stage(
        &self,
        stage: StageKind,
        env: &Arc<StageEnv<C>>,
        provider: &Arc<dyn TargetProvider>,
        config: &Arc<EngineConfig>,
        observer: &Arc<dyn StageObserver>,
    ) -> StageState {
        observer.on_stage_start(stage);
        let result = run_stage(stage, env.clone(), provider.clone(), config.clone()).await;
        self.settle_stage(&env.scan_id, stage, result, observer)
    }

    fn settle_stage(
        &self,
        scan_id: &ScanId,
        stage: StageKind,
        result: Result<StageReport, EngineError>,
        observer: &Arc<dyn StageObserver>,
    ) -> StageState {
        match result {
            Ok(report) => {
                match report.state {
                    StageState::Skipped => observer.on_stage_skip(stage, &report.detail),
                    _ => observer.on_stage_complete(stage, &report),
                }
                info!(
                    stage = %stage,
                    state = %report.state,
                    records = report.records,
                    detail = %report.detail,
                    "stage settled"
                );
                report.state
            }
            Err(EngineError::Cancelled) => {
                warn!(stage = %stage, "stage cancelled");
                if let Err(err) = self.stores.scans.set_stage_status(
                    scan_id,
                    stage.as_str(),
                    StageState::Cancelled,
                ) {
                    warn!(stage = %stage, error = %err, "could not mark stage cancelled");
                }
                StageState::Cancelled
            }
            Err(err) => {
                error!(stage = %stage, error = %err, "stage failed");
                observer.on_stage_fail(stage, &err.to_string());
                StageState::Failed
            }
        }
    }

    fn mark_pending_cancelled(&self, scan_id: &ScanId) {
        let Ok(scan) = self.stores.scans.get(scan_id) else {
            return;
        };
        for entry in &scan.stage_progress {
            if entry.status == StageState::Pending || entry.status == StageState::Running {
                let _ = self
                    .stores
                    .scans
                    .set_stage_status(scan_id, &entry.name, StageState::Cancelled);
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
