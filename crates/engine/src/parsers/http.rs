// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for JSON-per-line HTTP probe output (site scan, URL fetch).

use arx_core::net::extract_hostname;
use arx_core::sanitize::sanitize;
use arx_core::scan::ScanId;
use arx_core::snapshot::{EndpointSnapshot, WebSiteSnapshot};
use serde::Deserialize;

/// One probed URL as the prober reported it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpRecord {
    #[serde(default)]
    pub url: String,
    /// The line the prober was fed, when it echoes it back. Endpoint
    /// records key on this when present, since probers may normalize
    /// `url` in ways that change an endpoint's meaning.
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub content_length: Option<u64>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub webserver: String,
    #[serde(default, alias = "body")]
    pub response_body: String,
    #[serde(default, alias = "raw_header")]
    pub response_headers: String,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub vhost: bool,
    #[serde(default)]
    pub failed: bool,
}

/// Parse one prober output line. Returns None for non-JSON lines,
/// non-object values, and records without a URL.
pub fn parse_line(line: &str) -> Option<HttpRecord> {
    let line = sanitize(line);
    let mut record: HttpRecord = serde_json::from_str(&line).ok()?;
    record.url = sanitize(&record.url);
    if record.url.is_empty() {
        return None;
    }
    record.input = sanitize(&record.input);
    record.title = sanitize(&record.title);
    record.content_type = sanitize(&record.content_type);
    record.location = sanitize(&record.location);
    record.webserver = sanitize(&record.webserver);
    record.response_body = sanitize(&record.response_body);
    record.response_headers = sanitize(&record.response_headers);
    record.tech = record.tech.iter().map(|t| sanitize(t)).collect();
    let host = sanitize(&record.host);
    record.host = if host.is_empty() {
        extract_hostname(&record.url)
    } else {
        host
    };
    Some(record)
}

impl HttpRecord {
    pub fn to_website_snapshot(&self, scan_id: ScanId) -> WebSiteSnapshot {
        WebSiteSnapshot {
            scan_id,
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

    pub fn to_endpoint_snapshot(&self, scan_id: ScanId) -> EndpointSnapshot {
        let url = if self.input.is_empty() {
            self.url.clone()
        } else {
            self.input.clone()
        };
        EndpointSnapshot {
            scan_id,
            url,
            host: self.host.clone(),
            title: self.title.clone(),
            status_code: self.status_code,
            content_length: self.content_length,
            content_type: self.content_type.clone(),
            webserver: self.webserver.clone(),
            location: self.location.clone(),
            tech: self.tech.clone(),
            matched_patterns: Vec::new(),
            response_headers: self.response_headers.clone(),
            response_body: self.response_body.clone(),
            vhost: self.vhost,
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
