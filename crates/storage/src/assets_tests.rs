// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::targets::TargetStore;
use arx_core::clock::FakeClock;
use arx_core::target::TargetKind;

fn fixture() -> (AssetStore, TargetId) {
    let handle = StorageHandle::connect();
    let targets = TargetStore::new(handle.clone(), FakeClock::default());
    let target = targets
        .create(TargetId::new("t1"), "example.com", TargetKind::Domain)
        .unwrap();
    (AssetStore::new(handle), target.id)
}

fn site(target_id: &TargetId, url: &str) -> WebSite {
    WebSite {
        target_id: target_id.clone(),
        url: url.to_string(),
        ..WebSite::default()
    }
}

#[test]
fn subdomain_upsert_is_idempotent() {
    let (assets, t) = fixture();
    let row = Subdomain {
        target_id: t.clone(),
        name: "api.example.com".to_string(),
    };
    assert_eq!(assets.upsert_subdomains(&[row.clone()]).unwrap(), 1);
    assert_eq!(assets.upsert_subdomains(&[row]).unwrap(), 0);
    let names: Vec<String> = assets
        .subdomain_names(&t, 100)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, vec!["api.example.com"]);
}

#[test]
fn upsert_against_missing_target_is_a_constraint_error() {
    let (assets, _) = fixture();
    let err = assets
        .upsert_subdomains(&[Subdomain {
            target_id: TargetId::new("ghost"),
            name: "x.example.com".to_string(),
        }])
        .unwrap_err();
    assert!(err.is_integrity());
}

#[test]
fn website_overwrite_mode_replaces_scalars_and_unions_tech() {
    let (assets, t) = fixture();
    let mut first = site(&t, "https://example.com");
    first.title = "Old".to_string();
    first.tech = vec!["nginx".to_string()];
    assets.upsert_websites(&[first], MergeMode::Overwrite).unwrap();

    let mut second = site(&t, "https://example.com");
    second.title = "New".to_string();
    second.tech = vec!["nginx".to_string(), "react".to_string()];
    assets.upsert_websites(&[second], MergeMode::Overwrite).unwrap();

    let stored = assets.get_website(&t, "https://example.com").unwrap().unwrap();
    assert_eq!(stored.title, "New");
    assert_eq!(stored.tech, vec!["nginx".to_string(), "react".to_string()]);
}

#[test]
fn website_fill_empty_mode_keeps_existing_scalars() {
    let (assets, t) = fixture();
    let mut first = site(&t, "https://x/");
    first.title = String::new();
    first.tech = vec!["nginx".to_string()];
    assets.upsert_websites(&[first], MergeMode::Overwrite).unwrap();

    // Fingerprint pass: title fills because empty, status fills because
    // NULL, tech unions.
    let mut fp = site(&t, "https://x/");
    fp.title = "Home".to_string();
    fp.status_code = Some(200);
    fp.tech = vec!["WordPress".to_string(), "jQuery".to_string()];
    assets.upsert_websites(&[fp], MergeMode::FillEmpty).unwrap();

    let stored = assets.get_website(&t, "https://x/").unwrap().unwrap();
    assert_eq!(stored.title, "Home");
    assert_eq!(stored.status_code, Some(200));
    assert_eq!(
        stored.tech,
        vec![
            "nginx".to_string(),
            "WordPress".to_string(),
            "jQuery".to_string()
        ]
    );

    // Second fingerprint pass must not clobber the filled title.
    let mut fp2 = site(&t, "https://x/");
    fp2.title = "Other".to_string();
    assets.upsert_websites(&[fp2], MergeMode::FillEmpty).unwrap();
    let stored = assets.get_website(&t, "https://x/").unwrap().unwrap();
    assert_eq!(stored.title, "Home");
}

#[test]
fn endpoint_upsert_unions_matched_patterns() {
    let (assets, t) = fixture();
    let first = Endpoint {
        target_id: t.clone(),
        url: "https://example.com/login?next=/".to_string(),
        matched_patterns: vec!["redirect".to_string()],
        ..Endpoint::default()
    };
    let second = Endpoint {
        target_id: t.clone(),
        url: "https://example.com/login?next=/".to_string(),
        matched_patterns: vec!["redirect".to_string(), "sqli".to_string()],
        ..Endpoint::default()
    };
    assets.upsert_endpoints(&[first], MergeMode::Overwrite).unwrap();
    assets.upsert_endpoints(&[second], MergeMode::Overwrite).unwrap();

    let urls: Vec<String> = assets
        .endpoint_urls(&t, 100)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(urls.len(), 1);
    let counts = assets.counts_for_target(&t).unwrap();
    assert_eq!(counts.endpoints, 1);
}

#[test]
fn host_ports_are_distinct_by_host_and_port() {
    let (assets, t) = fixture();
    let rows = vec![
        HostPortMapping {
            target_id: t.clone(),
            host: "a.example.com".to_string(),
            ip: "10.0.0.1".to_string(),
            port: 443,
        },
        HostPortMapping {
            target_id: t.clone(),
            host: "a.example.com".to_string(),
            ip: "10.0.0.2".to_string(),
            port: 443,
        },
        HostPortMapping {
            target_id: t.clone(),
            host: "a.example.com".to_string(),
            ip: "10.0.0.1".to_string(),
            port: 80,
        },
    ];
    assert_eq!(assets.upsert_host_ports(&rows).unwrap(), 3);

    let pairs: Vec<(String, u16)> = assets
        .host_ports(&t, 100)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(pairs.len(), 2);
    assert!(pairs.contains(&("a.example.com".to_string(), 443)));
    assert!(pairs.contains(&("a.example.com".to_string(), 80)));
}

#[test]
fn vulnerabilities_insert_per_natural_key() {
    let (assets, t) = fixture();
    let vuln = |vuln_type: &str, source: &str, severity| Vulnerability {
        target_id: t.clone(),
        url: "https://example.com/admin".to_string(),
        vuln_type: vuln_type.to_string(),
        source: source.to_string(),
        severity,
        ..Vulnerability::default()
    };
    assets
        .insert_vulnerabilities(&[
            vuln("exposed-panel", "nuclei", Severity::High),
            vuln("exposed-panel", "other-scanner", Severity::High),
            vuln("weak-tls", "nuclei", Severity::Low),
        ])
        .unwrap();

    let rows = assets.vulnerabilities_for_target(&t).unwrap();
    assert_eq!(rows.len(), 3);

    let counts = assets.counts_for_target(&t).unwrap();
    assert_eq!(counts.vulns_total, 3);
    assert_eq!(counts.vulns_high, 2);
    assert_eq!(counts.vulns_low, 1);
}

#[test]
fn counts_cover_all_kinds() {
    let (assets, t) = fixture();
    assets
        .upsert_subdomains(&[Subdomain {
            target_id: t.clone(),
            name: "api.example.com".to_string(),
        }])
        .unwrap();
    assets
        .upsert_websites(&[site(&t, "https://api.example.com")], MergeMode::Overwrite)
        .unwrap();
    assets
        .upsert_directories(&[Directory {
            target_id: t.clone(),
            url: "https://api.example.com/admin/".to_string(),
            status_code: Some(403),
            ..Directory::default()
        }])
        .unwrap();

    let counts = assets.counts_for_target(&t).unwrap();
    assert_eq!(counts.subdomains, 1);
    assert_eq!(counts.websites, 1);
    assert_eq!(counts.directories, 1);
    assert_eq!(counts.endpoints, 0);
}
