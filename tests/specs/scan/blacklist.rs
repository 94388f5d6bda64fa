//! Scenario: blacklist rules shape what providers emit and exports write.

use crate::prelude::*;
use arx_core::asset::Subdomain;
use arx_core::blacklist::{BlacklistRule, RuleKind};
use arx_core::scan::ScanMode;
use arx_core::target::TargetKind;
use arx_engine::{export_targets, ExportSource, TargetProvider};

fn seed(platform: &Platform, target_id: &arx_core::target::TargetId, names: &[&str]) {
    let rows: Vec<Subdomain> = names
        .iter()
        .map(|n| Subdomain {
            target_id: target_id.clone(),
            name: n.to_string(),
        })
        .collect();
    platform.stores.assets.upsert_subdomains(&rows).unwrap();
}

#[tokio::test]
async fn suffix_rule_filters_the_subdomain_export() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    seed(
        &platform,
        &target_id,
        &[
            "api.example.com",
            "internal.example.com",
            "api.internal.example.com",
        ],
    );
    platform
        .stores
        .blacklists
        .set_target_rules(
            &target_id,
            vec![BlacklistRule::new("internal.example.com", RuleKind::Suffix)],
        )
        .unwrap();

    let provider = arx_engine::InventoryProvider::new(
        platform.stores.targets.clone(),
        platform.stores.assets.clone(),
        platform.stores.blacklists.clone(),
        target_id.clone(),
        None,
    );

    // The provider only ever emits allowed values.
    let names: Vec<String> = provider
        .subdomains()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, vec!["api.example.com"]);

    // And the export task reports source=subdomains, count=1.
    let out = platform.tmp.path().join("subs.txt");
    let outcome = export_targets(&provider, &[ExportSource::Subdomains], &out).unwrap();
    assert_eq!(outcome.source, Some(ExportSource::Subdomains));
    assert_eq!(outcome.written, 1);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "api.example.com\n");
}

#[tokio::test]
async fn blacklisted_root_produces_an_empty_scan_not_a_fallback() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    platform
        .stores
        .blacklists
        .set_target_rules(
            &target_id,
            vec![BlacklistRule::new("example.com", RuleKind::Suffix)],
        )
        .unwrap();

    // Site scan finds nothing (default URLs exist but are blacklisted);
    // the stage proceeds with zero rows rather than failing.
    let config = r#"
[site_scan]
enabled = true

[site_scan.tools.http_prober]
command = "cat ${input_file}"
"#;
    let scan = platform.run_scan(&target_id, config, ScanMode::Full).await;
    assert_completed(&scan);
    assert_eq!(scan.counts.websites, 0);
}

#[tokio::test]
async fn global_rules_apply_to_every_target() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    seed(&platform, &target_id, &["a.example.com", "b.staging.example.com"]);
    platform
        .stores
        .blacklists
        .set_global_rules(vec![BlacklistRule::new("staging", RuleKind::Substring)])
        .unwrap();

    let provider = arx_engine::InventoryProvider::new(
        platform.stores.targets.clone(),
        platform.stores.assets.clone(),
        platform.stores.blacklists.clone(),
        target_id,
        None,
    );
    let names: Vec<String> = provider
        .subdomains()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, vec!["a.example.com"]);
}
