// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target providers: the iterator abstraction every stage pulls its
//! inputs from.
//!
//! Two interchangeable implementations: [`InventoryProvider`] reads the
//! target's asset inventory (FULL mode), [`SnapshotProvider`] reads the
//! snapshots of the current scan (QUICK mode). Stage code never branches
//! on which one it holds.

use arx_core::blacklist::BlacklistFilter;
use arx_core::clock::Clock;
use arx_core::net::{expand_cidr, host_port_urls};
use arx_core::scan::ScanId;
use arx_core::target::{TargetId, TargetKind};
use arx_storage::{AssetStore, BlacklistStore, RowIter, SnapshotStore, StoreError, TargetStore};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

/// Chunk size for all provider-backed storage iterators.
pub const PROVIDER_CHUNK_SIZE: usize = 1000;

type NextFn = Box<dyn FnMut() -> Result<Option<String>, StoreError> + Send>;

/// A closable stream of target strings.
///
/// Tracks how many raw values the underlying source produced and how many
/// the blacklist removed, which the export task needs to decide whether a
/// fall-back is allowed.
pub struct TargetIter {
    next: Option<NextFn>,
    raw: Arc<AtomicU64>,
    filtered_out: Arc<AtomicU64>,
}

impl TargetIter {
    fn new(next: NextFn, raw: Arc<AtomicU64>, filtered_out: Arc<AtomicU64>) -> Self {
        Self {
            next: Some(next),
            raw,
            filtered_out,
        }
    }

    /// Wrap a storage iterator, optionally filtering through a blacklist.
    pub fn from_rows(rows: RowIter<String>, blacklist: Option<Arc<BlacklistFilter>>) -> Self {
        let raw = Arc::new(AtomicU64::new(0));
        let filtered_out = Arc::new(AtomicU64::new(0));
        let raw_in = raw.clone();
        let filtered_in = filtered_out.clone();
        let mut rows = rows;
        let next: NextFn = Box::new(move || loop {
            match rows.next_row()? {
                None => return Ok(None),
                Some(value) => {
                    raw_in.fetch_add(1, Ordering::Relaxed);
                    if let Some(filter) = &blacklist {
                        if !filter.is_allowed(&value) {
                            filtered_in.fetch_add(1, Ordering::Relaxed);
                            continue;
                        }
                    }
                    return Ok(Some(value));
                }
            }
        });
        Self::new(next, raw, filtered_out)
    }

    /// Expand `(host, port)` pairs into probe URLs.
    pub fn from_host_ports(
        pairs: RowIter<(String, u16)>,
        blacklist: Option<Arc<BlacklistFilter>>,
    ) -> Self {
        let raw = Arc::new(AtomicU64::new(0));
        let filtered_out = Arc::new(AtomicU64::new(0));
        let raw_in = raw.clone();
        let filtered_in = filtered_out.clone();
        let mut pairs = pairs;
        let mut pending: VecDeque<String> = VecDeque::new();
        let next: NextFn = Box::new(move || loop {
            if let Some(url) = pending.pop_front() {
                return Ok(Some(url));
            }
            match pairs.next_row()? {
                None => return Ok(None),
                Some((host, port)) => {
                    for url in host_port_urls(&host, port) {
                        raw_in.fetch_add(1, Ordering::Relaxed);
                        match &blacklist {
                            Some(filter) if !filter.is_allowed(&url) => {
                                filtered_in.fetch_add(1, Ordering::Relaxed);
                            }
                            _ => pending.push_back(url),
                        }
                    }
                }
            }
        });
        Self::new(next, raw, filtered_out)
    }

    /// A fixed set of values, still counted and filtered.
    pub fn from_values(values: Vec<String>, blacklist: Option<Arc<BlacklistFilter>>) -> Self {
        Self::from_rows(RowIter::from_vec(values), blacklist)
    }

    /// An iterator that yields nothing.
    pub fn empty() -> Self {
        Self::from_values(Vec::new(), None)
    }

    /// Expand each value into zero or more values, keeping the raw and
    /// filtered counters of the underlying source.
    pub fn flat_map_values(
        mut self,
        mut expand: impl FnMut(&str) -> Vec<String> + Send + 'static,
    ) -> TargetIter {
        let raw = self.raw.clone();
        let filtered_out = self.filtered_out.clone();
        let mut pending: VecDeque<String> = VecDeque::new();
        let next: NextFn = Box::new(move || loop {
            if let Some(value) = pending.pop_front() {
                return Ok(Some(value));
            }
            match self.next_value()? {
                None => return Ok(None),
                Some(value) => pending.extend(expand(&value)),
            }
        });
        TargetIter::new(next, raw, filtered_out)
    }

    pub fn next_value(&mut self) -> Result<Option<String>, StoreError> {
        let Some(next) = self.next.as_mut() else {
            return Ok(None);
        };
        let result = next();
        if matches!(result, Ok(None)) {
            self.close();
        }
        result
    }

    /// Release the underlying cursor early.
    pub fn close(&mut self) {
        self.next = None;
    }

    /// Values produced by the source before filtering.
    pub fn raw_count(&self) -> u64 {
        self.raw.load(Ordering::Relaxed)
    }

    /// Values removed by the blacklist.
    pub fn filtered_count(&self) -> u64 {
        self.filtered_out.load(Ordering::Relaxed)
    }
}

impl Iterator for TargetIter {
    type Item = Result<String, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_value().transpose()
    }
}

/// The provider interface: one method per input kind plus context.
pub trait TargetProvider: Send + Sync {
    /// The target's name (root domain / IP / CIDR), if resolvable.
    fn target_name(&self) -> Result<Option<String>, StoreError>;

    fn target_kind(&self) -> Result<Option<TargetKind>, StoreError>;

    fn subdomains(&self) -> TargetIter;

    /// `http(s)://host[:port]` URLs derived from host-port observations.
    fn host_port_urls(&self) -> TargetIter;

    /// URLs of confirmed-live websites.
    fn websites(&self) -> TargetIter;

    /// Endpoint URLs (paths and parameters included).
    fn endpoints(&self) -> TargetIter;

    /// URLs derived from the target itself, for runs that skip the
    /// earlier discovery stages.
    fn default_urls(&self) -> TargetIter;

    fn blacklist(&self) -> Option<Arc<BlacklistFilter>>;

    fn target_id(&self) -> Option<TargetId>;

    fn scan_id(&self) -> Option<ScanId>;
}

fn default_urls_for_target<C: Clock>(
    targets: &TargetStore<C>,
    target_id: Option<&TargetId>,
    blacklist: Option<Arc<BlacklistFilter>>,
) -> TargetIter {
    let Some(target_id) = target_id else {
        warn!("no target id set, cannot generate default URLs");
        return TargetIter::empty();
    };
    let target = match targets.get(target_id) {
        Ok(target) => target,
        Err(err) => {
            warn!(target_id = %target_id, error = %err, "cannot generate default URLs");
            return TargetIter::empty();
        }
    };
    match target.kind {
        TargetKind::Domain | TargetKind::Ip => {
            let urls = vec![
                format!("http://{}", target.name),
                format!("https://{}", target.name),
            ];
            TargetIter::from_values(urls, blacklist)
        }
        TargetKind::Cidr => match expand_cidr(&target.name) {
            Ok(hosts) => {
                let mut hosts = hosts;
                let mut pending: VecDeque<String> = VecDeque::new();
                let raw = Arc::new(AtomicU64::new(0));
                let filtered_out = Arc::new(AtomicU64::new(0));
                let raw_in = raw.clone();
                let filtered_in = filtered_out.clone();
                let next: NextFn = Box::new(move || loop {
                    if let Some(url) = pending.pop_front() {
                        return Ok(Some(url));
                    }
                    match hosts.next() {
                        None => return Ok(None),
                        Some(ip) => {
                            for url in [format!("http://{ip}"), format!("https://{ip}")] {
                                raw_in.fetch_add(1, Ordering::Relaxed);
                                match &blacklist {
                                    Some(filter) if !filter.is_allowed(&url) => {
                                        filtered_in.fetch_add(1, Ordering::Relaxed);
                                    }
                                    _ => pending.push_back(url),
                                }
                            }
                        }
                    }
                });
                TargetIter::new(next, raw, filtered_out)
            }
            Err(err) => {
                error!(target = %target.name, error = %err, "CIDR parse failed");
                TargetIter::empty()
            }
        },
    }
}

/// FULL-mode provider: reads the target's asset inventory, filtered
/// through the target's blacklist (loaded lazily, cached for the
/// provider's lifetime).
pub struct InventoryProvider<C: Clock> {
    targets: TargetStore<C>,
    assets: AssetStore,
    blacklists: BlacklistStore,
    target_id: TargetId,
    scan_id: Option<ScanId>,
    cached_filter: Mutex<Option<Arc<BlacklistFilter>>>,
}

impl<C: Clock> InventoryProvider<C> {
    pub fn new(
        targets: TargetStore<C>,
        assets: AssetStore,
        blacklists: BlacklistStore,
        target_id: TargetId,
        scan_id: Option<ScanId>,
    ) -> Self {
        Self {
            targets,
            assets,
            blacklists,
            target_id,
            scan_id,
            cached_filter: Mutex::new(None),
        }
    }

    fn filter(&self) -> Arc<BlacklistFilter> {
        let mut cached = self.cached_filter.lock();
        if let Some(filter) = cached.as_ref() {
            return filter.clone();
        }
        let filter = match self
            .blacklists
            .rules_for(&self.target_id)
            .map_err(|e| e.to_string())
            .and_then(|rules| BlacklistFilter::new(&rules).map_err(|e| e.to_string()))
        {
            Ok(filter) => Arc::new(filter),
            Err(err) => {
                // Rules are validated at write time, so this path means
                // the store itself failed; scanning unfiltered would
                // violate operator intent less than halting would help.
                error!(target_id = %self.target_id, error = %err, "blacklist load failed, using empty filter");
                Arc::new(BlacklistFilter::empty())
            }
        };
        *cached = Some(filter.clone());
        filter
    }
}

impl<C: Clock> TargetProvider for InventoryProvider<C> {
    fn target_name(&self) -> Result<Option<String>, StoreError> {
        Ok(self.targets.get(&self.target_id).ok().map(|t| t.name))
    }

    fn target_kind(&self) -> Result<Option<TargetKind>, StoreError> {
        Ok(self.targets.get(&self.target_id).ok().map(|t| t.kind))
    }

    fn subdomains(&self) -> TargetIter {
        TargetIter::from_rows(
            self.assets.subdomain_names(&self.target_id, PROVIDER_CHUNK_SIZE),
            Some(self.filter()),
        )
    }

    fn host_port_urls(&self) -> TargetIter {
        TargetIter::from_host_ports(
            self.assets.host_ports(&self.target_id, PROVIDER_CHUNK_SIZE),
            Some(self.filter()),
        )
    }

    fn websites(&self) -> TargetIter {
        TargetIter::from_rows(
            self.assets.website_urls(&self.target_id, PROVIDER_CHUNK_SIZE),
            Some(self.filter()),
        )
    }

    fn endpoints(&self) -> TargetIter {
        TargetIter::from_rows(
            self.assets.endpoint_urls(&self.target_id, PROVIDER_CHUNK_SIZE),
            Some(self.filter()),
        )
    }

    fn default_urls(&self) -> TargetIter {
        default_urls_for_target(&self.targets, Some(&self.target_id), Some(self.filter()))
    }

    fn blacklist(&self) -> Option<Arc<BlacklistFilter>> {
        Some(self.filter())
    }

    fn target_id(&self) -> Option<TargetId> {
        Some(self.target_id.clone())
    }

    fn scan_id(&self) -> Option<ScanId> {
        self.scan_id.clone()
    }
}

/// QUICK-mode provider: reads only what the current scan observed.
/// No blacklist; the stage that produced each snapshot already filtered.
pub struct SnapshotProvider<C: Clock> {
    targets: TargetStore<C>,
    snapshots: SnapshotStore,
    scan_id: ScanId,
    target_id: Option<TargetId>,
}

impl<C: Clock> SnapshotProvider<C> {
    pub fn new(
        targets: TargetStore<C>,
        snapshots: SnapshotStore,
        scan_id: ScanId,
        target_id: Option<TargetId>,
    ) -> Self {
        Self {
            targets,
            snapshots,
            scan_id,
            target_id,
        }
    }
}

impl<C: Clock> TargetProvider for SnapshotProvider<C> {
    fn target_name(&self) -> Result<Option<String>, StoreError> {
        let Some(target_id) = &self.target_id else {
            return Ok(None);
        };
        Ok(self.targets.get(target_id).ok().map(|t| t.name))
    }

    fn target_kind(&self) -> Result<Option<TargetKind>, StoreError> {
        let Some(target_id) = &self.target_id else {
            return Ok(None);
        };
        Ok(self.targets.get(target_id).ok().map(|t| t.kind))
    }

    fn subdomains(&self) -> TargetIter {
        TargetIter::from_rows(
            self.snapshots.subdomain_names(&self.scan_id, PROVIDER_CHUNK_SIZE),
            None,
        )
    }

    fn host_port_urls(&self) -> TargetIter {
        TargetIter::from_host_ports(
            self.snapshots.host_ports(&self.scan_id, PROVIDER_CHUNK_SIZE),
            None,
        )
    }

    fn websites(&self) -> TargetIter {
        TargetIter::from_rows(
            self.snapshots.website_urls(&self.scan_id, PROVIDER_CHUNK_SIZE),
            None,
        )
    }

    fn endpoints(&self) -> TargetIter {
        TargetIter::from_rows(
            self.snapshots.endpoint_urls(&self.scan_id, PROVIDER_CHUNK_SIZE),
            None,
        )
    }

    fn default_urls(&self) -> TargetIter {
        default_urls_for_target(&self.targets, self.target_id.as_ref(), None)
    }

    fn blacklist(&self) -> Option<Arc<BlacklistFilter>> {
        None
    }

    fn target_id(&self) -> Option<TargetId> {
        self.target_id.clone()
    }

    fn scan_id(&self) -> Option<ScanId> {
        Some(self.scan_id.clone())
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
