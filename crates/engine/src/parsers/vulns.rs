// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for vulnerability-scanner JSON output.

use arx_core::asset::Severity;
use arx_core::sanitize::sanitize;
use arx_core::scan::ScanId;
use arx_core::snapshot::VulnerabilitySnapshot;
use serde::Deserialize;

#[derive(Debug, Clone, Default)]
pub struct VulnRecord {
    pub url: String,
    pub vuln_type: String,
    pub severity: Severity,
    pub cvss_score: Option<f64>,
    pub description: String,
    pub raw_output: String,
}

#[derive(Deserialize)]
struct Classification {
    #[serde(default, rename = "cvss-score")]
    cvss_score: Option<f64>,
}

#[derive(Deserialize)]
struct Info {
    #[serde(default)]
    name: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    classification: Option<Classification>,
}

#[derive(Deserialize)]
struct JsonLine {
    #[serde(default, rename = "template-id", alias = "template_id")]
    template_id: String,
    #[serde(default, rename = "matched-at", alias = "matched_at")]
    matched_at: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    info: Option<Info>,
}

pub fn parse_line(line: &str) -> Option<VulnRecord> {
    let cleaned = sanitize(line);
    let parsed: JsonLine = serde_json::from_str(&cleaned).ok()?;
    let url = if parsed.matched_at.is_empty() {
        sanitize(&parsed.host)
    } else {
        sanitize(&parsed.matched_at)
    };
    if url.is_empty() {
        return None;
    }
    let info = parsed.info;
    let vuln_type = if parsed.template_id.is_empty() {
        info.as_ref().map(|i| sanitize(&i.name)).unwrap_or_default()
    } else {
        sanitize(&parsed.template_id)
    };
    if vuln_type.is_empty() {
        return None;
    }
    Some(VulnRecord {
        url,
        vuln_type,
        severity: info
            .as_ref()
            .map(|i| Severity::from_label(&i.severity))
            .unwrap_or_default(),
        cvss_score: info
            .as_ref()
            .and_then(|i| i.classification.as_ref())
            .and_then(|c| c.cvss_score),
        description: info.as_ref().map(|i| sanitize(&i.description)).unwrap_or_default(),
        raw_output: cleaned,
    })
}

impl VulnRecord {
    /// `source` is the reporting tool's name; it is part of the natural
    /// key, so the same finding from two scanners stays two rows.
    pub fn to_snapshot(&self, scan_id: ScanId, source: &str) -> VulnerabilitySnapshot {
        VulnerabilitySnapshot {
            scan_id,
            url: self.url.clone(),
            vuln_type: self.vuln_type.clone(),
            source: source.to_string(),
            severity: self.severity,
            cvss_score: self.cvss_score,
            description: self.description.clone(),
            raw_output: self.raw_output.clone(),
        }
    }
}

#[cfg(test)]
#[path = "vulns_tests.rs"]
mod tests;
