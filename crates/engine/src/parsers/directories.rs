// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for directory-bruteforce JSON output.

use arx_core::sanitize::sanitize;
use arx_core::scan::ScanId;
use arx_core::snapshot::DirectorySnapshot;
use serde::Deserialize;

#[derive(Debug, Clone, Default)]
pub struct DirectoryRecord {
    pub url: String,
    pub status_code: Option<u16>,
    pub content_length: Option<u64>,
    pub words: Option<u64>,
    pub lines: Option<u64>,
    pub content_type: String,
    pub latency_ms: Option<u64>,
}

#[derive(Deserialize)]
struct JsonLine {
    #[serde(default)]
    url: String,
    #[serde(default, alias = "status_code")]
    status: Option<u16>,
    #[serde(default, alias = "content_length")]
    length: Option<u64>,
    #[serde(default)]
    words: Option<u64>,
    #[serde(default)]
    lines: Option<u64>,
    #[serde(default, alias = "content_type", rename = "content-type")]
    content_type: String,
    /// Request duration in nanoseconds, as the bruteforcer reports it.
    #[serde(default)]
    duration: Option<u64>,
}

pub fn parse_line(line: &str) -> Option<DirectoryRecord> {
    let cleaned = sanitize(line);
    let parsed: JsonLine = serde_json::from_str(&cleaned).ok()?;
    let url = sanitize(&parsed.url);
    if url.is_empty() {
        return None;
    }
    Some(DirectoryRecord {
        url,
        status_code: parsed.status,
        content_length: parsed.length,
        words: parsed.words,
        lines: parsed.lines,
        content_type: sanitize(&parsed.content_type),
        latency_ms: parsed.duration.map(|ns| ns / 1_000_000),
    })
}

impl DirectoryRecord {
    pub fn to_snapshot(&self, scan_id: ScanId) -> DirectorySnapshot {
        DirectorySnapshot {
            scan_id,
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

#[cfg(test)]
#[path = "directories_tests.rs"]
mod tests;
