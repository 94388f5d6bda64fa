// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asset records: deduplicated observations owned by a target.
//!
//! Each kind is keyed by `(target, natural key)`. Mutable fields follow the
//! field-merge policy applied at the store layer: set-valued fields are
//! unioned, scalar fields overwrite on conflict unless the writer asks for
//! fill-only-if-empty semantics (fingerprint detection).

use crate::target::TargetId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vulnerability severity taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
    #[default]
    Unknown,
}

impl Severity {
    /// Normalize a tool-reported severity label. Unrecognized labels map
    /// to `Unknown` rather than erroring, since scanners disagree on
    /// spellings.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" | "crit" => Severity::Critical,
            "high" => Severity::High,
            "medium" | "moderate" => Severity::Medium,
            "low" => Severity::Low,
            "info" | "informational" | "informative" => Severity::Info,
            _ => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
            Severity::Info => write!(f, "info"),
            Severity::Unknown => write!(f, "unknown"),
        }
    }
}

/// A discovered subdomain. Key: `(target, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subdomain {
    pub target_id: TargetId,
    pub name: String,
}

/// An open port observed on a host. Key: `(target, host, ip, port)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPortMapping {
    pub target_id: TargetId,
    pub host: String,
    pub ip: String,
    pub port: u16,
}

/// A live website confirmed by the HTTP prober. Key: `(target, url)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebSite {
    #[serde(default)]
    pub target_id: TargetId,
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
    /// Redirect location, when the probe followed one.
    #[serde(default)]
    pub location: String,
    /// Detected technology stack; set-valued, unioned on merge.
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub response_headers: String,
    #[serde(default)]
    pub response_body: String,
    #[serde(default)]
    pub vhost: bool,
}

/// An endpoint URL (path plus parameters). Key: `(target, url)`.
///
/// Same shape as [`WebSite`] plus the matched sensitive-pattern tags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub target_id: TargetId,
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
    /// Sensitive-URL pattern tags; set-valued, unioned on merge.
    #[serde(default)]
    pub matched_patterns: Vec<String>,
    #[serde(default)]
    pub response_headers: String,
    #[serde(default)]
    pub response_body: String,
    #[serde(default)]
    pub vhost: bool,
}

/// A brute-forced directory or file hit. Key: `(target, url)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub target_id: TargetId,
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

/// A reported vulnerability. Key: `(target, url, vuln_type, source)`.
///
/// No merge on conflict: distinct natural keys insert distinct rows, and a
/// repeat observation of the same key overwrites scalar fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default)]
    pub target_id: TargetId,
    pub url: String,
    pub vuln_type: String,
    /// Reporting tool name.
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

#[cfg(test)]
#[path = "asset_tests.rs"]
mod tests;
