// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stage `auto` timeout formulas.
//!
//! The constants are load-bearing: they trade tool runtime against the
//! risk of killing a scan that was still making progress, and match the
//! behavior operators already tuned around.

use arx_config::TimeoutSetting;
use std::time::Duration;

/// Resolve a configured timeout: explicit seconds win, `auto` (or absent)
/// asks the per-stage formula.
pub fn resolve(setting: Option<TimeoutSetting>, auto: impl FnOnce() -> u64) -> Duration {
    match setting {
        Some(TimeoutSetting::Secs(secs)) => Duration::from_secs(secs),
        Some(TimeoutSetting::Auto) | None => Duration::from_secs(auto()),
    }
}

/// Port scan: half a second per (target, port) pair, floor 60 s.
pub fn port_scan_auto(target_count: u64, port_count: u64) -> u64 {
    (target_count.saturating_mul(port_count) / 2).max(60)
}

/// Site scan: one second per input line, floor 60 s.
pub fn site_scan_auto(input_lines: u64) -> u64 {
    input_lines.max(60)
}

/// Fingerprint detect: ten seconds per URL, floor 300 s.
pub fn fingerprint_auto(url_count: u64) -> u64 {
    (url_count.saturating_mul(10)).max(300)
}

/// Directory scan, per URL: one second per wordlist entry, floor 60 s.
pub fn directory_scan_auto(wordlist_lines: u64) -> u64 {
    wordlist_lines.max(60)
}

/// Subdomain bruteforce: three seconds per wordlist entry, 3600 s when
/// the wordlist size is unknown.
pub fn bruteforce_auto(wordlist_lines: u64) -> u64 {
    if wordlist_lines == 0 {
        3_600
    } else {
        wordlist_lines.saturating_mul(3)
    }
}

/// DNS resolve: three seconds per input line, 3600 s for empty input.
pub fn resolve_auto(input_lines: u64) -> u64 {
    if input_lines == 0 {
        3_600
    } else {
        input_lines.saturating_mul(3)
    }
}

/// URL fetch and vuln scan: one second per line with a generous floor.
pub fn url_tool_auto(input_lines: u64) -> u64 {
    input_lines.max(600)
}

#[cfg(test)]
#[path = "timeouts_tests.rs"]
mod tests;
