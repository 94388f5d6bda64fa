// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan store: rows, lifecycle transitions, stage progress, cached counts.

use crate::error::StoreError;
use crate::handle::StorageHandle;
use arx_core::clock::Clock;
use arx_core::scan::{Scan, ScanCounts, ScanId, ScanMode, ScanStatus, StageProgress};
use arx_core::stage::StageState;
use arx_core::worker::WorkerId;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ScanStore<C: Clock> {
    handle: StorageHandle,
    clock: C,
}

impl<C: Clock> ScanStore<C> {
    pub fn new(handle: StorageHandle, clock: C) -> Self {
        Self { handle, clock }
    }

    /// Persist a new scan row. The results directory must be globally
    /// unique; a clash is a duplicate-key error.
    pub fn create(&self, scan: Scan) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            if tables.scans.contains_key(&scan.id) {
                return Err(StoreError::DuplicateKey(format!("scan id {}", scan.id)));
            }
            let dir_clash = tables
                .scans
                .values()
                .any(|s| s.results_dir == scan.results_dir);
            if dir_clash {
                return Err(StoreError::DuplicateKey(format!(
                    "results dir {}",
                    scan.results_dir.display()
                )));
            }
            tables.scans.insert(scan.id.clone(), scan);
            Ok(())
        })
    }

    /// Fetch a live (non-soft-deleted) scan.
    pub fn get(&self, id: &ScanId) -> Result<Scan, StoreError> {
        self.handle.run(|tables| {
            tables
                .scans
                .get(id)
                .filter(|s| !s.is_deleted())
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))
        })
    }

    pub fn list(&self) -> Result<Vec<Scan>, StoreError> {
        self.handle.run(|tables| {
            Ok(tables
                .scans
                .values()
                .filter(|s| !s.is_deleted())
                .cloned()
                .collect())
        })
    }

    /// Whether the scan exists and is not soft-deleted. The sink consults
    /// this before every flush so late tool output cannot land after a
    /// cancel-plus-delete.
    pub fn is_live(&self, id: &ScanId) -> Result<bool, StoreError> {
        self.handle.run(|tables| {
            Ok(tables
                .scans
                .get(id)
                .map(|s| !s.is_deleted())
                .unwrap_or(false))
        })
    }

    /// Transition the scan's status. Illegal transitions (leaving a
    /// terminal state, RUNNING back to INITIATED) are rejected.
    pub fn update_status(&self, id: &ScanId, next: ScanStatus) -> Result<Scan, StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get_mut(id)
                .filter(|s| !s.is_deleted())
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            if !scan.status.can_transition_to(next) {
                return Err(StoreError::Invalid(format!(
                    "illegal scan transition {} -> {}",
                    scan.status, next
                )));
            }
            info!(scan_id = %id, from = %scan.status, to = %next, "scan status");
            scan.status = next;
            if next.is_terminal() {
                scan.stopped_at_ms = Some(now);
            }
            Ok(scan.clone())
        })
    }

    pub fn set_error_message(&self, id: &ScanId, message: &str) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            scan.error_message = message.chars().take(2000).collect();
            Ok(())
        })
    }

    pub fn set_worker(&self, id: &ScanId, worker_id: &WorkerId) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            scan.worker_id = Some(worker_id.clone());
            Ok(())
        })
    }

    pub fn append_container_id(&self, id: &ScanId, container_id: &str) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            scan.container_ids.push(container_id.to_string());
            Ok(())
        })
    }

    /// Reset the ordered stage list to pending and zero the progress.
    pub fn init_stage_progress(&self, id: &ScanId, stages: &[String]) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get_mut(id)
                .filter(|s| !s.is_deleted())
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            scan.stage_progress = stages
                .iter()
                .map(|name| StageProgress {
                    name: name.clone(),
                    status: StageState::Pending,
                })
                .collect();
            scan.progress = 0;
            scan.current_stage = String::new();
            Ok(())
        })
    }

    /// Flip one stage's status and recompute the scan-level progress.
    pub fn set_stage_status(
        &self,
        id: &ScanId,
        stage: &str,
        status: StageState,
    ) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get_mut(id)
                .filter(|s| !s.is_deleted())
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            match scan.stage_mut(stage) {
                Some(entry) => entry.status = status,
                None => {
                    warn!(scan_id = %id, stage, "stage not in progress list");
                    return Err(StoreError::Invalid(format!("unknown stage {stage}")));
                }
            }
            if status == StageState::Running {
                scan.current_stage = stage.to_string();
            }
            scan.recompute_progress();
            Ok(())
        })
    }

    /// Recompute the cached counts from the live tables: asset counts for
    /// FULL-mode scans, snapshot counts for QUICK-mode scans. The
    /// screenshot count is file-backed and survives the refresh.
    pub fn refresh_cached_counts(&self, id: &ScanId) -> Result<ScanCounts, StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get(id)
                .filter(|s| !s.is_deleted())
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;

            let mut counts = ScanCounts {
                screenshots: scan.counts.screenshots,
                ..ScanCounts::default()
            };
            match scan.mode {
                ScanMode::Full => {
                    let t = &scan.target_id;
                    counts.subdomains =
                        tables.subdomains.keys().filter(|(x, _)| x == t).count() as u64;
                    counts.host_ports =
                        tables.host_ports.keys().filter(|(x, _, _, _)| x == t).count() as u64;
                    counts.websites =
                        tables.websites.keys().filter(|(x, _)| x == t).count() as u64;
                    counts.endpoints =
                        tables.endpoints.keys().filter(|(x, _)| x == t).count() as u64;
                    counts.directories =
                        tables.directories.keys().filter(|(x, _)| x == t).count() as u64;
                    for ((x, _, _, _), vuln) in tables.vulnerabilities.iter() {
                        if x != t {
                            continue;
                        }
                        counts.vulns_total += 1;
                        bump_severity(&mut counts, vuln.severity);
                    }
                }
                ScanMode::Quick => {
                    counts.subdomains =
                        tables.subdomain_snaps.keys().filter(|(x, _)| x == id).count() as u64;
                    counts.host_ports = tables
                        .host_port_snaps
                        .keys()
                        .filter(|(x, _, _, _)| x == id)
                        .count() as u64;
                    counts.websites =
                        tables.website_snaps.keys().filter(|(x, _)| x == id).count() as u64;
                    counts.endpoints =
                        tables.endpoint_snaps.keys().filter(|(x, _)| x == id).count() as u64;
                    counts.directories = tables
                        .directory_snaps
                        .keys()
                        .filter(|(x, _)| x == id)
                        .count() as u64;
                    for ((x, _, _, _), vuln) in tables.vuln_snaps.iter() {
                        if x != id {
                            continue;
                        }
                        counts.vulns_total += 1;
                        bump_severity(&mut counts, vuln.severity);
                    }
                }
            }

            let scan = tables
                .scans
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            scan.counts = counts;
            scan.stats_updated_at_ms = Some(now);
            Ok(counts)
        })
    }

    /// Record the number of screenshot files rendered by this scan.
    pub fn set_screenshot_count(&self, id: &ScanId, count: u64) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            scan.counts.screenshots = count;
            Ok(())
        })
    }

    /// Phase one of delete: make the row invisible to reads.
    pub fn soft_delete(&self, id: &ScanId) -> Result<Scan, StoreError> {
        let now = self.clock.epoch_ms();
        self.handle.run(|tables| {
            let scan = tables
                .scans
                .get_mut(id)
                .filter(|s| !s.is_deleted())
                .ok_or_else(|| StoreError::NotFound(format!("scan {id}")))?;
            scan.deleted_at_ms = Some(now);
            Ok(scan.clone())
        })
    }

    /// Phase two of delete: remove the row and its snapshots for good.
    pub fn hard_delete(&self, id: &ScanId) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            tables.scans.remove(id);
            tables.subdomain_snaps.retain(|(s, _), _| s != id);
            tables.host_port_snaps.retain(|(s, _, _, _), _| s != id);
            tables.website_snaps.retain(|(s, _), _| s != id);
            tables.endpoint_snaps.retain(|(s, _), _| s != id);
            tables.directory_snaps.retain(|(s, _), _| s != id);
            tables.vuln_snaps.retain(|(s, _, _, _), _| s != id);
            Ok(())
        })
    }
}

fn bump_severity(counts: &mut ScanCounts, severity: arx_core::asset::Severity) {
    use arx_core::asset::Severity;
    match severity {
        Severity::Critical => counts.vulns_critical += 1,
        Severity::High => counts.vulns_high += 1,
        Severity::Medium => counts.vulns_medium += 1,
        Severity::Low => counts.vulns_low += 1,
        Severity::Info | Severity::Unknown => {}
    }
}

#[cfg(test)]
#[path = "scans_tests.rs"]
mod tests;
