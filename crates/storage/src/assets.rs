// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asset store: upsert-with-merge writes and chunk-streamed reads.
//!
//! Upserts implement the field-merge policy: set-valued fields (tech,
//! matched patterns) are unioned and deduplicated; scalar fields follow
//! the caller's [`MergeMode`]. Vulnerability rows never merge.

use crate::error::StoreError;
use crate::handle::StorageHandle;
use crate::iter::{paged_fetch, RowIter};
use arx_core::asset::{
    Directory, Endpoint, HostPortMapping, Severity, Subdomain, Vulnerability, WebSite,
};
use arx_core::target::TargetId;

fn target_id_of(key: &(TargetId, String)) -> &TargetId {
    &key.0
}

/// How scalar fields behave when an upsert hits an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Incoming scalars overwrite stored scalars (last writer wins).
    Overwrite,
    /// Incoming scalars land only where the stored value is NULL/empty.
    /// Used by fingerprint detection for title, webserver, status code,
    /// and content length.
    FillEmpty,
}

/// Live asset counts for one target, used for the cached-count refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetCounts {
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

fn union_into(dest: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        if !dest.iter().any(|d| d == item) {
            dest.push(item.clone());
        }
    }
}

fn fill_string(dest: &mut String, incoming: &str) {
    if dest.is_empty() && !incoming.is_empty() {
        *dest = incoming.to_string();
    }
}

fn fill_option<T: Copy>(dest: &mut Option<T>, incoming: Option<T>) {
    if dest.is_none() {
        *dest = incoming;
    }
}

/// Asset reads and writes for every kind, keyed by `(target, natural key)`.
#[derive(Clone)]
pub struct AssetStore {
    handle: StorageHandle,
}

impl AssetStore {
    pub fn new(handle: StorageHandle) -> Self {
        Self { handle }
    }

    fn ensure_target_live(
        tables: &crate::tables::Tables,
        target_id: &TargetId,
    ) -> Result<(), StoreError> {
        let live = tables
            .targets
            .get(target_id)
            .map(|t| !t.is_deleted())
            .unwrap_or(false);
        if live {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!(
                "target {target_id} is missing or deleted"
            )))
        }
    }

    // === writes ===

    pub fn upsert_subdomains(&self, rows: &[Subdomain]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut created = 0;
            for row in rows {
                Self::ensure_target_live(tables, &row.target_id)?;
                let key = (row.target_id.clone(), row.name.clone());
                if tables.subdomains.insert(key, row.clone()).is_none() {
                    created += 1;
                }
            }
            Ok(created)
        })
    }

    pub fn upsert_host_ports(&self, rows: &[HostPortMapping]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut created = 0;
            for row in rows {
                Self::ensure_target_live(tables, &row.target_id)?;
                let key = (
                    row.target_id.clone(),
                    row.host.clone(),
                    row.ip.clone(),
                    row.port,
                );
                if tables.host_ports.insert(key, row.clone()).is_none() {
                    created += 1;
                }
            }
            Ok(created)
        })
    }

    pub fn upsert_websites(&self, rows: &[WebSite], mode: MergeMode) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut created = 0;
            for row in rows {
                Self::ensure_target_live(tables, &row.target_id)?;
                let key = (row.target_id.clone(), row.url.clone());
                match tables.websites.get_mut(&key) {
                    None => {
                        tables.websites.insert(key, row.clone());
                        created += 1;
                    }
                    Some(existing) => {
                        union_into(&mut existing.tech, &row.tech);
                        match mode {
                            MergeMode::Overwrite => {
                                existing.host = row.host.clone();
                                existing.title = row.title.clone();
                                existing.status_code = row.status_code;
                                existing.content_length = row.content_length;
                                existing.content_type = row.content_type.clone();
                                existing.webserver = row.webserver.clone();
                                existing.location = row.location.clone();
                                existing.response_headers = row.response_headers.clone();
                                existing.response_body = row.response_body.clone();
                                existing.vhost = row.vhost;
                            }
                            MergeMode::FillEmpty => {
                                fill_string(&mut existing.title, &row.title);
                                fill_string(&mut existing.webserver, &row.webserver);
                                fill_option(&mut existing.status_code, row.status_code);
                                fill_option(&mut existing.content_length, row.content_length);
                            }
                        }
                    }
                }
            }
            Ok(created)
        })
    }

    pub fn upsert_endpoints(
        &self,
        rows: &[Endpoint],
        mode: MergeMode,
    ) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut created = 0;
            for row in rows {
                Self::ensure_target_live(tables, &row.target_id)?;
                let key = (row.target_id.clone(), row.url.clone());
                match tables.endpoints.get_mut(&key) {
                    None => {
                        tables.endpoints.insert(key, row.clone());
                        created += 1;
                    }
                    Some(existing) => {
                        union_into(&mut existing.tech, &row.tech);
                        union_into(&mut existing.matched_patterns, &row.matched_patterns);
                        match mode {
                            MergeMode::Overwrite => {
                                existing.host = row.host.clone();
                                existing.title = row.title.clone();
                                existing.status_code = row.status_code;
                                existing.content_length = row.content_length;
                                existing.content_type = row.content_type.clone();
                                existing.webserver = row.webserver.clone();
                                existing.location = row.location.clone();
                                existing.response_headers = row.response_headers.clone();
                                existing.response_body = row.response_body.clone();
                                existing.vhost = row.vhost;
                            }
                            MergeMode::FillEmpty => {
                                fill_string(&mut existing.title, &row.title);
                                fill_string(&mut existing.webserver, &row.webserver);
                                fill_option(&mut existing.status_code, row.status_code);
                                fill_option(&mut existing.content_length, row.content_length);
                            }
                        }
                    }
                }
            }
            Ok(created)
        })
    }

    pub fn upsert_directories(&self, rows: &[Directory]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut created = 0;
            for row in rows {
                Self::ensure_target_live(tables, &row.target_id)?;
                let key = (row.target_id.clone(), row.url.clone());
                if tables.directories.insert(key, row.clone()).is_none() {
                    created += 1;
                }
            }
            Ok(created)
        })
    }

    /// Insert vulnerability rows. Same natural key overwrites; distinct
    /// keys produce distinct rows, so one URL can carry many findings.
    pub fn insert_vulnerabilities(&self, rows: &[Vulnerability]) -> Result<usize, StoreError> {
        self.handle.run(|tables| {
            let mut created = 0;
            for row in rows {
                Self::ensure_target_live(tables, &row.target_id)?;
                let key = (
                    row.target_id.clone(),
                    row.url.clone(),
                    row.vuln_type.clone(),
                    row.source.clone(),
                );
                if tables.vulnerabilities.insert(key, row.clone()).is_none() {
                    created += 1;
                }
            }
            Ok(created)
        })
    }

    // === reads ===

    /// Subdomain names for a target, chunk-streamed.
    pub fn subdomain_names(&self, target_id: &TargetId, chunk_size: usize) -> RowIter<String> {
        let fetch = paged_fetch!(
            subdomains,
            target_id.clone(),
            (target_id.clone(), String::new()),
            target_id_of,
            |row: &Subdomain| row.name.clone()
        );
        RowIter::new(self.handle.clone(), chunk_size, fetch)
    }

    /// Distinct `(host, port)` pairs for a target, chunk-streamed.
    ///
    /// Rows differing only by ip collapse to one pair; the seen-set lives
    /// for the lifetime of the iterator.
    pub fn host_ports(&self, target_id: &TargetId, chunk_size: usize) -> RowIter<(String, u16)> {
        let scope = target_id.clone();
        let start = (scope.clone(), String::new(), String::new(), 0u16);
        let mut resume: Option<(TargetId, String, String, u16)> = None;
        let mut seen: std::collections::HashSet<(String, u16)> = std::collections::HashSet::new();
        let fetch: crate::iter::FetchFn<(String, u16)> = Box::new(
            move |tables: &mut crate::tables::Tables, chunk_size: usize| {
                use std::ops::Bound;
                let lower = match &resume {
                    Some(last) => Bound::Excluded(last.clone()),
                    None => Bound::Included(start.clone()),
                };
                let mut out = Vec::new();
                for (key, row) in tables.host_ports.range((lower, Bound::Unbounded)) {
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

    /// Website URLs for a target, chunk-streamed.
    pub fn website_urls(&self, target_id: &TargetId, chunk_size: usize) -> RowIter<String> {
        let fetch = paged_fetch!(
            websites,
            target_id.clone(),
            (target_id.clone(), String::new()),
            target_id_of,
            |row: &WebSite| row.url.clone()
        );
        RowIter::new(self.handle.clone(), chunk_size, fetch)
    }

    /// Endpoint URLs for a target, chunk-streamed.
    pub fn endpoint_urls(&self, target_id: &TargetId, chunk_size: usize) -> RowIter<String> {
        let fetch = paged_fetch!(
            endpoints,
            target_id.clone(),
            (target_id.clone(), String::new()),
            target_id_of,
            |row: &Endpoint| row.url.clone()
        );
        RowIter::new(self.handle.clone(), chunk_size, fetch)
    }

    pub fn get_website(
        &self,
        target_id: &TargetId,
        url: &str,
    ) -> Result<Option<WebSite>, StoreError> {
        let key = (target_id.clone(), url.to_string());
        self.handle
            .run(|tables| Ok(tables.websites.get(&key).cloned()))
    }

    pub fn get_subdomain(
        &self,
        target_id: &TargetId,
        name: &str,
    ) -> Result<Option<Subdomain>, StoreError> {
        let key = (target_id.clone(), name.to_string());
        self.handle
            .run(|tables| Ok(tables.subdomains.get(&key).cloned()))
    }

    pub fn vulnerabilities_for_target(
        &self,
        target_id: &TargetId,
    ) -> Result<Vec<Vulnerability>, StoreError> {
        self.handle.run(|tables| {
            Ok(tables
                .vulnerabilities
                .iter()
                .filter(|((t, _, _, _), _)| t == target_id)
                .map(|(_, v)| v.clone())
                .collect())
        })
    }

    /// Live counts for one target.
    pub fn counts_for_target(&self, target_id: &TargetId) -> Result<AssetCounts, StoreError> {
        self.handle.run(|tables| {
            let mut counts = AssetCounts {
                subdomains: tables
                    .subdomains
                    .keys()
                    .filter(|(t, _)| t == target_id)
                    .count() as u64,
                host_ports: tables
                    .host_ports
                    .keys()
                    .filter(|(t, _, _, _)| t == target_id)
                    .count() as u64,
                websites: tables
                    .websites
                    .keys()
                    .filter(|(t, _)| t == target_id)
                    .count() as u64,
                endpoints: tables
                    .endpoints
                    .keys()
                    .filter(|(t, _)| t == target_id)
                    .count() as u64,
                directories: tables
                    .directories
                    .keys()
                    .filter(|(t, _)| t == target_id)
                    .count() as u64,
                ..AssetCounts::default()
            };
            for ((t, _, _, _), vuln) in tables.vulnerabilities.iter() {
                if t != target_id {
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
}

#[cfg(test)]
#[path = "assets_tests.rs"]
mod tests;
