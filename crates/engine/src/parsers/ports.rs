// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for port-scanner output.
//!
//! Accepts JSON-per-line `{"host": ..., "ip": ..., "port": ...}` and the
//! plain `host:port` form some scanners emit.

use arx_core::sanitize::sanitize;
use arx_core::scan::ScanId;
use arx_core::snapshot::HostPortSnapshot;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    pub host: String,
    pub ip: String,
    pub port: u16,
}

#[derive(Deserialize)]
struct JsonLine {
    #[serde(default)]
    host: String,
    #[serde(default)]
    ip: String,
    port: u16,
}

pub fn parse_line(line: &str) -> Option<PortRecord> {
    let cleaned = sanitize(line);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with('{') {
        let parsed: JsonLine = serde_json::from_str(trimmed).ok()?;
        let host = if parsed.host.is_empty() {
            parsed.ip.clone()
        } else {
            parsed.host
        };
        if host.is_empty() {
            return None;
        }
        return Some(PortRecord {
            host: host.to_ascii_lowercase(),
            ip: parsed.ip,
            port: parsed.port,
        });
    }

    // host:port
    let (host, port) = trimmed.rsplit_once(':')?;
    let port: u16 = port.trim().parse().ok()?;
    let host = host.trim().to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let ip = if host.parse::<std::net::IpAddr>().is_ok() {
        host.clone()
    } else {
        String::new()
    };
    Some(PortRecord { host, ip, port })
}

impl PortRecord {
    pub fn to_snapshot(&self, scan_id: ScanId) -> HostPortSnapshot {
        HostPortSnapshot {
            scan_id,
            host: self.host.clone(),
            ip: self.ip.clone(),
            port: self.port,
        }
    }
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
