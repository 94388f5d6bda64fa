// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot-plus-asset sinks.
//!
//! Every flush does three things, in order:
//! 1. Checks that the scan still exists and is not soft-deleted; if it is
//!    gone the batch is dropped with a log line, so a tool that kept
//!    producing after a cancel cannot write late rows.
//! 2. Deduplicates the batch by natural key, keeping the last occurrence.
//! 3. Writes snapshot rows (insert-ignore, scoped to the scan) and upserts
//!    asset rows (scoped to the target) under the field-merge policy.

use arx_core::clock::Clock;
use arx_core::scan::ScanId;
use arx_core::snapshot::{
    DirectorySnapshot, EndpointSnapshot, HostPortSnapshot, SubdomainSnapshot,
    VulnerabilitySnapshot, WebSiteSnapshot,
};
use arx_core::target::TargetId;
use arx_storage::{AssetStore, MergeMode, ScanStore, SnapshotStore, StoreError};
use std::collections::HashMap;
use tracing::warn;

/// Where a batched writer delivers records.
pub trait RecordSink<R>: Send {
    /// Persist a batch; returns how many records were accepted.
    fn flush(&self, batch: &[R]) -> Result<usize, StoreError>;
}

/// Keep only the last occurrence of each natural key, preserving the
/// order in which keys first appeared.
fn dedup_last_by_key<R: Clone, K: std::hash::Hash + Eq>(
    batch: &[R],
    key_of: impl Fn(&R) -> K,
) -> Vec<R> {
    let mut index_of: HashMap<K, usize> = HashMap::with_capacity(batch.len());
    let mut out: Vec<Option<R>> = Vec::with_capacity(batch.len());
    for record in batch {
        let key = key_of(record);
        match index_of.get(&key) {
            Some(&i) => out[i] = Some(record.clone()),
            None => {
                index_of.insert(key, out.len());
                out.push(Some(record.clone()));
            }
        }
    }
    out.into_iter().flatten().collect()
}

/// Shared plumbing for the per-kind sinks.
pub struct SinkContext<C: Clock> {
    pub scans: ScanStore<C>,
    pub snapshots: SnapshotStore,
    pub assets: AssetStore,
    pub scan_id: ScanId,
    pub target_id: TargetId,
}

impl<C: Clock> SinkContext<C> {
    /// False means the scan vanished and the batch must be dropped.
    fn scan_alive(&self) -> Result<bool, StoreError> {
        let alive = self.scans.is_live(&self.scan_id)?;
        if !alive {
            warn!(scan_id = %self.scan_id, "scan missing or deleted, dropping batch");
        }
        Ok(alive)
    }
}

impl<C: Clock> Clone for SinkContext<C> {
    fn clone(&self) -> Self {
        Self {
            scans: self.scans.clone(),
            snapshots: self.snapshots.clone(),
            assets: self.assets.clone(),
            scan_id: self.scan_id.clone(),
            target_id: self.target_id.clone(),
        }
    }
}

pub struct SubdomainSink<C: Clock>(pub SinkContext<C>);

impl<C: Clock> RecordSink<SubdomainSnapshot> for SubdomainSink<C> {
    fn flush(&self, batch: &[SubdomainSnapshot]) -> Result<usize, StoreError> {
        let ctx = &self.0;
        if !ctx.scan_alive()? {
            return Ok(0);
        }
        let rows = dedup_last_by_key(batch, |r| r.name.clone());
        ctx.snapshots.insert_subdomains(&rows)?;
        let assets: Vec<_> = rows.iter().map(|r| r.to_asset(ctx.target_id.clone())).collect();
        ctx.assets.upsert_subdomains(&assets)?;
        Ok(rows.len())
    }
}

pub struct HostPortSink<C: Clock>(pub SinkContext<C>);

impl<C: Clock> RecordSink<HostPortSnapshot> for HostPortSink<C> {
    fn flush(&self, batch: &[HostPortSnapshot]) -> Result<usize, StoreError> {
        let ctx = &self.0;
        if !ctx.scan_alive()? {
            return Ok(0);
        }
        let rows = dedup_last_by_key(batch, |r| (r.host.clone(), r.ip.clone(), r.port));
        ctx.snapshots.insert_host_ports(&rows)?;
        let assets: Vec<_> = rows.iter().map(|r| r.to_asset(ctx.target_id.clone())).collect();
        ctx.assets.upsert_host_ports(&assets)?;
        Ok(rows.len())
    }
}

/// Website sink; `merge_mode` distinguishes the prober (overwrite) from
/// fingerprint detection (fill-only-if-empty).
pub struct WebsiteSink<C: Clock> {
    pub ctx: SinkContext<C>,
    pub merge_mode: MergeMode,
}

impl<C: Clock> RecordSink<WebSiteSnapshot> for WebsiteSink<C> {
    fn flush(&self, batch: &[WebSiteSnapshot]) -> Result<usize, StoreError> {
        let ctx = &self.ctx;
        if !ctx.scan_alive()? {
            return Ok(0);
        }
        let rows = dedup_last_by_key(batch, |r| r.url.clone());
        ctx.snapshots.insert_websites(&rows)?;
        let assets: Vec<_> = rows.iter().map(|r| r.to_asset(ctx.target_id.clone())).collect();
        ctx.assets.upsert_websites(&assets, self.merge_mode)?;
        Ok(rows.len())
    }
}

pub struct EndpointSink<C: Clock>(pub SinkContext<C>);

impl<C: Clock> RecordSink<EndpointSnapshot> for EndpointSink<C> {
    fn flush(&self, batch: &[EndpointSnapshot]) -> Result<usize, StoreError> {
        let ctx = &self.0;
        if !ctx.scan_alive()? {
            return Ok(0);
        }
        let rows = dedup_last_by_key(batch, |r| r.url.clone());
        ctx.snapshots.insert_endpoints(&rows)?;
        let assets: Vec<_> = rows.iter().map(|r| r.to_asset(ctx.target_id.clone())).collect();
        ctx.assets.upsert_endpoints(&assets, MergeMode::Overwrite)?;
        Ok(rows.len())
    }
}

pub struct DirectorySink<C: Clock>(pub SinkContext<C>);

impl<C: Clock> RecordSink<DirectorySnapshot> for DirectorySink<C> {
    fn flush(&self, batch: &[DirectorySnapshot]) -> Result<usize, StoreError> {
        let ctx = &self.0;
        if !ctx.scan_alive()? {
            return Ok(0);
        }
        let rows = dedup_last_by_key(batch, |r| r.url.clone());
        ctx.snapshots.insert_directories(&rows)?;
        let assets: Vec<_> = rows.iter().map(|r| r.to_asset(ctx.target_id.clone())).collect();
        ctx.assets.upsert_directories(&assets)?;
        Ok(rows.len())
    }
}

pub struct VulnerabilitySink<C: Clock>(pub SinkContext<C>);

impl<C: Clock> RecordSink<VulnerabilitySnapshot> for VulnerabilitySink<C> {
    fn flush(&self, batch: &[VulnerabilitySnapshot]) -> Result<usize, StoreError> {
        let ctx = &self.0;
        if !ctx.scan_alive()? {
            return Ok(0);
        }
        let rows =
            dedup_last_by_key(batch, |r| (r.url.clone(), r.vuln_type.clone(), r.source.clone()));
        ctx.snapshots.insert_vulnerabilities(&rows)?;
        let assets: Vec<_> = rows.iter().map(|r| r.to_asset(ctx.target_id.clone())).collect();
        ctx.assets.insert_vulnerabilities(&assets)?;
        Ok(rows.len())
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
