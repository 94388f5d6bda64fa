// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    critical      = { "critical",      Severity::Critical },
    crit_short    = { "crit",          Severity::Critical },
    high_upper    = { "HIGH",          Severity::High },
    medium        = { "medium",        Severity::Medium },
    moderate      = { "moderate",      Severity::Medium },
    low_padded    = { " low ",         Severity::Low },
    info          = { "info",          Severity::Info },
    informational = { "informational", Severity::Info },
    garbage       = { "wat",           Severity::Unknown },
    empty         = { "",              Severity::Unknown },
)]
fn severity_labels(label: &str, expected: Severity) {
    assert_eq!(Severity::from_label(label), expected);
}

#[test]
fn severity_display_round_trips() {
    for sev in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
        Severity::Unknown,
    ] {
        assert_eq!(Severity::from_label(&sev.to_string()), sev);
    }
}

#[test]
fn website_defaults_are_empty() {
    let site = WebSite {
        url: "https://example.com".to_string(),
        ..WebSite::default()
    };
    assert!(site.title.is_empty());
    assert!(site.tech.is_empty());
    assert!(site.status_code.is_none());
    assert!(!site.vhost);
}

#[test]
fn website_serde_skips_absent_options() {
    let site = WebSite {
        url: "https://example.com".to_string(),
        ..WebSite::default()
    };
    let json = serde_json::to_string(&site).unwrap();
    assert!(!json.contains("status_code"));
    assert!(!json.contains("content_length"));
}
