// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage names and per-stage status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The eight scan stages, in canonical pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    SubdomainDiscovery,
    PortScan,
    SiteScan,
    UrlFetch,
    DirectoryScan,
    FingerprintDetect,
    Screenshot,
    VulnScan,
}

impl StageKind {
    /// All stages in canonical order.
    pub const ALL: [StageKind; 8] = [
        StageKind::SubdomainDiscovery,
        StageKind::PortScan,
        StageKind::SiteScan,
        StageKind::UrlFetch,
        StageKind::DirectoryScan,
        StageKind::FingerprintDetect,
        StageKind::Screenshot,
        StageKind::VulnScan,
    ];

    /// Stages that run sequentially before the analysis fan-out.
    pub const DISCOVERY: [StageKind; 3] = [
        StageKind::SubdomainDiscovery,
        StageKind::PortScan,
        StageKind::SiteScan,
    ];

    /// Stages that may run in parallel once discovery is done.
    pub const ANALYSIS: [StageKind; 5] = [
        StageKind::UrlFetch,
        StageKind::DirectoryScan,
        StageKind::FingerprintDetect,
        StageKind::Screenshot,
        StageKind::VulnScan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::SubdomainDiscovery => "subdomain_discovery",
            StageKind::PortScan => "port_scan",
            StageKind::SiteScan => "site_scan",
            StageKind::UrlFetch => "url_fetch",
            StageKind::DirectoryScan => "directory_scan",
            StageKind::FingerprintDetect => "fingerprint_detect",
            StageKind::Screenshot => "screenshot",
            StageKind::VulnScan => "vuln_scan",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subdomain_discovery" => Ok(StageKind::SubdomainDiscovery),
            "port_scan" => Ok(StageKind::PortScan),
            "site_scan" => Ok(StageKind::SiteScan),
            "url_fetch" => Ok(StageKind::UrlFetch),
            "directory_scan" => Ok(StageKind::DirectoryScan),
            "fingerprint_detect" => Ok(StageKind::FingerprintDetect),
            "screenshot" => Ok(StageKind::Screenshot),
            "vuln_scan" => Ok(StageKind::VulnScan),
            other => Err(format!("unknown stage: {}", other)),
        }
    }
}

/// Status of a single stage within a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    Cancelled,
}

impl StageState {
    /// A stage in this state will not run again within the scan.
    pub fn is_settled(&self) -> bool {
        !matches!(self, StageState::Pending | StageState::Running)
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageState::Pending => write!(f, "pending"),
            StageState::Running => write!(f, "running"),
            StageState::Completed => write!(f, "completed"),
            StageState::Failed => write!(f, "failed"),
            StageState::Skipped => write!(f, "skipped"),
            StageState::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
