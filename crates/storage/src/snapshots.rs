// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot store: append-only, insert-ignore writes keyed by scan.
//!
//! Duplicates by natural key within one scan are silently skipped; rows
//! are never merged across runs.

use crate::error::StoreError;
use crate::handle::StorageHandle;
use crate::iter::{paged_fetch, RowIter};
use arx_core::asset::Severity;
use arx_core::scan::ScanId;
use arx_core::snapshot::{
    DirectorySnapshot, EndpointSnapshot, HostPortSnapshot, SubdomainSnapshot,
    VulnerabilitySnapshot, WebSiteSnapshot,
};

fn scan_id_of(key: &(ScanId, String)) -> &ScanId {
    &key.0
}

/// Snapshot counts for one scan, used for QUICK-mode cached counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotCounts {
    pub subdomains: u64,
    pub host_ports: u64,
    pub websites: u64,
    pub endpoints: u64,
    pub directories: u64,
    pub vulns_total: u64,
    pub vulns_critical: u64,
    pub vulns_high: u64,
    pub vulns_medium: u64,
    pub vulns_low: u64,
}

#[derive(Clone)]
pub struct SnapshotStore {
    handle: StorageHandle,
}

impl SnapshotStore {
    pub fn new(handle: StorageHandle) -> Self {
        Self { handle }
    }

    // === writes (insert-ignore) ===

    /// Returns how many rows were actually inserted; conflicts are skipped.
    pub fn insert_subdomains(&self, rows: &[SubdomainSnapshot]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut inserted = 0;
            for row in rows {
                let key = (row.scan_id.clone(), row.name.clone());
                if let std::collections::btree_map::Entry::Vacant(slot) =
                    tables.subdomain_snaps.entry(key)
                {
                    slot.insert(row.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
    }

    pub fn insert_host_ports(&self, rows: &[HostPortSnapshot]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut inserted = 0;
            for row in rows {
                let key = (
                    row.scan_id.clone(),
                    row.host.clone(),
                    row.ip.clone(),
                    row.port,
                );
                if let std::collections::btree_map::Entry::Vacant(slot) =
                    tables.host_port_snaps.entry(key)
                {
                    slot.insert(row.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
    }

    pub fn insert_websites(&self, rows: &[WebSiteSnapshot]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut inserted = 0;
            for row in rows {
                let key = (row.scan_id.clone(), row.url.clone());
                if let std::collections::btree_map::Entry::Vacant(slot) =
                    tables.website_snaps.entry(key)
                {
                    slot.insert(row.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
    }

    pub fn insert_endpoints(&self, rows: &[EndpointSnapshot]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut inserted = 0;
            for row in rows {
                let key = (row.scan_id.clone(), row.url.clone());
                if let std::collections::btree_map::Entry::Vacant(slot) =
                    tables.endpoint_snaps.entry(key)
                {
                    slot.insert(row.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
    }

    pub fn insert_directories(&self, rows: &[DirectorySnapshot]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut inserted = 0;
            for row in rows {
                let key = (row.scan_id.clone(), row.url.clone());
                if let std::collections::btree_map::Entry::Vacant(slot) =
                    tables.directory_snaps.entry(key)
                {
                    slot.insert(row.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
    }

    pub fn insert_vulnerabilities(
        &self,
        rows: &[VulnerabilitySnapshot],
    ) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut inserted = 0;
            for row in rows {
                let key = (
                    row.scan_id.clone(),
                    row.url.clone(),
                    row.vuln_type.clone(),
                    row.source.clone(),
                );
                if let std::collections::btree_map::Entry::Vacant(slot) =
                    tables.vuln_snaps.entry(key)
                {
                    slot.insert(row.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
    }

    // === reads ===

    pub fn subdomain_names(&self, scan_id: &ScanId, chunk_size: usize) -> RowIter<String> {
        let fetch = paged_fetch!(
            subdomain_snaps,
            scan_id.clone(),
            (scan_id.clone(), String::new()),
            scan_id_of,
            |row: &SubdomainSnapshot| row.name.clone()
        );
        RowIter::new(self.handle.clone(), chunk_size, fetch)
    }

    /// Distinct `(host, port)` pairs observed by this scan.
    pub fn host_ports(&self, scan_id: &ScanId, chunk_size: usize) -> RowIter<(String, u16)> {
        let scope = scan_id.clone();
        let start = (scope.clone(), String::new(), String::new(), 0u16);
        let mut resume: Option<(ScanId, String, String, u16)> = None;
        let mut seen: std::collections::HashSet<(String, u16)> = std::collections::HashSet::new();
        let fetch: crate::iter::FetchFn<(String, u16)> = Box::new(
            move |tables: &mut crate::tables::Tables, chunk_size: usize| {
                use std::ops::Bound;
                let lower = match &resume {
                    Some(last) => Bound::Excluded(last.clone()),
                    None => Bound::Included(start.clone()),
                };
                let mut out = Vec::new();
                for (key, row) in tables.host_port_snaps.range((lower, Bound::Unbounded)) {
                    if key.0 != scope {
                        break;
                    }
                    resume = Some(key.clone());
                    let pair = (row.host.clone(), row.port);
                    if seen.insert(pair.clone()) {
                        out.push(pair);
                        if out.len() >= chunk_size {
                            break;
                        }
                    }
                }
                Ok(out)
            },
        );
        RowIter::new(self.handle.clone(), chunk_size, fetch)
    }

    pub fn website_urls(&self, scan_id: &ScanId, chunk_size: usize) -> RowIter<String> {
        let fetch = paged_fetch!(
            website_snaps,
            scan_id.clone(),
            (scan_id.clone(), String::new()),
            scan_id_of,
            |row: &WebSiteSnapshot| row.url.clone()
        );
        RowIter::new(self.handle.clone(), chunk_size, fetch)
    }

    pub fn endpoint_urls(&self, scan_id: &ScanId, chunk_size: usize) -> RowIter<String> {
        let fetch = paged_fetch!(
            endpoint_snaps,
            scan_id.clone(),
            (scan_id.clone(), String::new()),
            scan_id_of,
            |row: &EndpointSnapshot| row.url.clone()
        );
        RowIter::new(self.handle.clone(), chunk_size, fetch)
    }

    pub fn websites_for_scan(&self, scan_id: &ScanId) -> Result<Vec<WebSiteSnapshot>, StoreError> {
        self.handle.run(|tables| {
            Ok(tables
                .website_snaps
                .iter()
                .filter(|((s, _), _)| s == scan_id)
                .map(|(_, row)| row.clone())
                .collect())
        })
    }

    pub fn subdomains_for_scan(
        &self,
        scan_id: &ScanId,
    ) -> Result<Vec<SubdomainSnapshot>, StoreError> {
        self.handle.run(|tables| {
            Ok(tables
                .subdomain_snaps
                .iter()
                .filter(|((s, _), _)| s == scan_id)
                .map(|(_, row)| row.clone())
                .collect())
        })
    }

    /// Counts for one scan's snapshots.
    pub fn counts_for_scan(&self, scan_id: &ScanId) -> Result<SnapshotCounts, StoreError> {
        self.handle.run(|tables| {
            let mut counts = SnapshotCounts {
                subdomains: tables
                    .subdomain_snaps
                    .keys()
                    .filter(|(s, _)| s == scan_id)
                    .count() as u64,
                host_ports: tables
                    .host_port_snaps
                    .keys()
                    .filter(|(s, _, _, _)| s == scan_id)
                    .count() as u64,
                websites: tables
                    .website_snaps
                    .keys()
                    .filter(|(s, _)| s == scan_id)
                    .count() as u64,
                endpoints: tables
                    .endpoint_snaps
                    .keys()
                    .filter(|(s, _)| s == scan_id)
                    .count() as u64,
                directories: tables
                    .directory_snaps
                    .keys()
                    .filter(|(s, _)| s == scan_id)
                    .count() as u64,
                ..SnapshotCounts::default()
            };
            for ((s, _, _, _), vuln) in tables.vuln_snaps.iter() {
                if s != scan_id {
                    continue;
                }
                counts.vulns_total += 1;
                match vuln.severity {
                    Severity::Critical => counts.vulns_critical += 1,
                    Severity::High => counts.vulns_high += 1,
                    Severity::Medium => counts.vulns_medium += 1,
                    Severity::Low => counts.vulns_low += 1,
                    Severity::Info | Severity::Unknown => {}
                }
            }
            Ok(counts)
        })
    }

    /// Hard-delete every snapshot row owned by `scan_id`.
    pub fn delete_for_scan(&self, scan_id: &ScanId) -> Result<(), StoreError> {
        self.handle.run(|tables| {
            tables.subdomain_snaps.retain(|(s, _), _| s != scan_id);
            tables.host_port_snaps.retain(|(s, _, _, _), _| s != scan_id);
            tables.website_snaps.retain(|(s, _), _| s != scan_id);
            tables.endpoint_snaps.retain(|(s, _), _| s != scan_id);
            tables.directory_snaps.retain(|(s, _), _| s != scan_id);
            tables.vuln_snaps.retain(|(s, _, _, _), _| s != scan_id);
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "snapshots_tests.rs"]
mod tests;
