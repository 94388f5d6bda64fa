// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for fingerprint-tool JSON output.
//!
//! The tool reports detected technologies in a comma-joined `cms` field
//! (`"WordPress, jQuery"`); the parser splits it into the tech set.

use arx_core::sanitize::sanitize;
use arx_core::scan::ScanId;
use arx_core::snapshot::WebSiteSnapshot;
use serde::Deserialize;

#[derive(Debug, Clone, Default)]
pub struct FingerprintRecord {
    pub url: String,
    pub tech: Vec<String>,
    pub title: String,
    pub webserver: String,
    pub status_code: Option<u16>,
    pub content_length: Option<u64>,
}

#[derive(Deserialize)]
struct JsonLine {
    #[serde(default)]
    url: String,
    #[serde(default)]
    cms: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "server")]
    webserver: String,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    content_length: Option<u64>,
}

pub fn parse_line(line: &str) -> Option<FingerprintRecord> {
    let cleaned = sanitize(line);
    let parsed: JsonLine = serde_json::from_str(&cleaned).ok()?;
    let url = sanitize(&parsed.url);
    if url.is_empty() {
        return None;
    }
    let tech: Vec<String> = parsed
        .cms
        .split(',')
        .map(|t| sanitize(t.trim()))
        .filter(|t| !t.is_empty())
        .collect();
    Some(FingerprintRecord {
        url,
        tech,
        title: sanitize(&parsed.title),
        webserver: sanitize(&parsed.webserver),
        status_code: parsed.status_code,
        content_length: parsed.content_length,
    })
}

impl FingerprintRecord {
    /// The snapshot carries the full parsed record; the asset upsert
    /// applies fill-only-if-empty for the scalars.
    pub fn to_website_snapshot(&self, scan_id: ScanId) -> WebSiteSnapshot {
        WebSiteSnapshot {
            scan_id,
            url: self.url.clone(),
            host: arx_core::net::extract_hostname(&self.url),
            title: self.title.clone(),
            status_code: self.status_code,
            content_length: self.content_length,
            webserver: self.webserver.clone(),
            tech: self.tech.clone(),
            ..WebSiteSnapshot::default()
        }
    }
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
