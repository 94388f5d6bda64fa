// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot records: point-in-time observations owned by a single scan.
//!
//! Snapshots mirror the asset kinds but are keyed by `(scan, natural key)`
//! and are append-only. They are never merged across runs; duplicates by
//! natural key within one scan are dropped at the store layer.
//!
//! The snapshot and asset types are deliberately disjoint flat records;
//! `to_asset(target_id)` is the only bridge between the two.

use crate::asset::{
    Directory, Endpoint, HostPortMapping, Severity, Subdomain, Vulnerability, WebSite,
};
use crate::scan::ScanId;
use crate::target::TargetId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainSnapshot {
    pub scan_id: ScanId,
    pub name: String,
}

impl SubdomainSnapshot {
    pub fn to_asset(&self, target_id: TargetId) -> Subdomain {
        Subdomain {
            target_id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPortSnapshot {
    pub scan_id: ScanId,
    pub host: String,
    pub ip: String,
    pub port: u16,
}

impl HostPortSnapshot {
    pub fn to_asset(&self, target_id: TargetId) -> HostPortMapping {
        HostPortMapping {
            target_id,
            host: self.host.clone(),
            ip: self.ip.clone(),
            port: self.port,
        }
    }
}

/// The exact website state observed during one scan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebSiteSnapshot {
    #[serde(default)]
    pub scan_id: ScanId,
    pub url: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub webserver: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub response_headers: String,
    #[serde(default)]
    pub response_body: String,
    #[serde(default)]
    pub vhost: bool,
}

impl WebSiteSnapshot {
    pub fn to_asset(&self, target_id: TargetId) -> WebSite {
        WebSite {
            target_id,
            url: self.url.clone(),
            host: self.host.clone(),
            title: self.title.clone(),
            status_code: self.status_code,
            content_length: self.content_length,
            content_type: self.content_type.clone(),
            webserver: self.webserver.clone(),
            location: self.location.clone(),
            tech: self.tech.clone(),
            response_headers: self.response_headers.clone(),
            response_body: self.response_body.clone(),
            vhost: self.vhost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndpointSnapshot {
    #[serde(default)]
    pub scan_id: ScanId,
    pub url: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub webserver: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub matched_patterns: Vec<String>,
    #[serde(default)]
    pub response_headers: String,
    #[serde(default)]
    pub response_body: String,
    #[serde(default)]
    pub vhost: bool,
}

impl EndpointSnapshot {
    pub fn to_asset(&self, target_id: TargetId) -> Endpoint {
        Endpoint {
            target_id,
            url: self.url.clone(),
            host: self.host.clone(),
            title: self.title.clone(),
            status_code: self.status_code,
            content_length: self.content_length,
            content_type: self.content_type.clone(),
            webserver: self.webserver.clone(),
            location: self.location.clone(),
            tech: self.tech.clone(),
            matched_patterns: self.matched_patterns.clone(),
            response_headers: self.response_headers.clone(),
            response_body: self.response_body.clone(),
            vhost: self.vhost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub scan_id: ScanId,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<u64>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl DirectorySnapshot {
    pub fn to_asset(&self, target_id: TargetId) -> Directory {
        Directory {
            target_id,
            url: self.url.clone(),
            status_code: self.status_code,
            content_length: self.content_length,
            words: self.words,
            lines: self.lines,
            content_type: self.content_type.clone(),
            latency_ms: self.latency_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VulnerabilitySnapshot {
    #[serde(default)]
    pub scan_id: ScanId,
    pub url: String,
    pub vuln_type: String,
    pub source: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub raw_output: String,
}

impl VulnerabilitySnapshot {
    pub fn to_asset(&self, target_id: TargetId) -> Vulnerability {
        Vulnerability {
            target_id,
            url: self.url.clone(),
            vuln_type: self.vuln_type.clone(),
            source: self.source.clone(),
            severity: self.severity,
            cvss_score: self.cvss_score,
            description: self.description.clone(),
            raw_output: self.raw_output.clone(),
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
