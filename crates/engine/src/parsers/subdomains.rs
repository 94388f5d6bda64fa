// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for plain-text subdomain lines.

use arx_core::sanitize::sanitize;
use arx_core::target::normalize_domain;

/// Parse one collector output line into a normalized domain name.
/// Non-domain noise (banners, blank lines, wildcard markers) is dropped.
pub fn parse_line(line: &str) -> Option<String> {
    let cleaned = sanitize(line);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    // Some resolvers emit "name. A 1.2.3.4"; keep the first token.
    let token = trimmed.split_whitespace().next()?;
    let token = token.strip_prefix("*.").unwrap_or(token);
    normalize_domain(token).ok()
}

#[cfg(test)]
#[path = "subdomains_tests.rs"]
mod tests;
