// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backing tables, keyed by natural keys.

use arx_core::asset::{
    Directory, Endpoint, HostPortMapping, Subdomain, Vulnerability, WebSite,
};
use arx_core::scan::{Scan, ScanId};
use arx_core::snapshot::{
    DirectorySnapshot, EndpointSnapshot, HostPortSnapshot, SubdomainSnapshot,
    VulnerabilitySnapshot, WebSiteSnapshot,
};
use arx_core::blacklist::BlacklistRule;
use arx_core::target::{Target, TargetId};
use arx_core::worker::{Worker, WorkerId, WorkerLoad};
use std::collections::BTreeMap;

/// A heartbeat entry with its expiry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeartbeatEntry {
    pub load: WorkerLoad,
    pub expires_at_ms: u64,
}

/// All tables share one lock; the relational layer this stands in for
/// commits each store call independently, which a single short critical
/// section models faithfully enough.
#[derive(Default)]
pub(crate) struct Tables {
    pub targets: BTreeMap<TargetId, Target>,

    // Asset tables, keyed by (target, natural key)
    pub subdomains: BTreeMap<(TargetId, String), Subdomain>,
    pub host_ports: BTreeMap<(TargetId, String, String, u16), HostPortMapping>,
    pub websites: BTreeMap<(TargetId, String), WebSite>,
    pub endpoints: BTreeMap<(TargetId, String), Endpoint>,
    pub directories: BTreeMap<(TargetId, String), Directory>,
    pub vulnerabilities: BTreeMap<(TargetId, String, String, String), Vulnerability>,

    // Snapshot tables, keyed by (scan, natural key minus target)
    pub subdomain_snaps: BTreeMap<(ScanId, String), SubdomainSnapshot>,
    pub host_port_snaps: BTreeMap<(ScanId, String, String, u16), HostPortSnapshot>,
    pub website_snaps: BTreeMap<(ScanId, String), WebSiteSnapshot>,
    pub endpoint_snaps: BTreeMap<(ScanId, String), EndpointSnapshot>,
    pub directory_snaps: BTreeMap<(ScanId, String), DirectorySnapshot>,
    pub vuln_snaps: BTreeMap<(ScanId, String, String, String), VulnerabilitySnapshot>,

    pub scans: BTreeMap<ScanId, Scan>,
    pub workers: BTreeMap<WorkerId, Worker>,
    pub heartbeats: BTreeMap<WorkerId, HeartbeatEntry>,

    // Blacklist rules: one global set plus per-target sets
    pub global_blacklist: Vec<BlacklistRule>,
    pub target_blacklist: BTreeMap<TargetId, Vec<BlacklistRule>>,
}
