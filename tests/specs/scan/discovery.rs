//! Scenario: a FULL scan of a domain with a single passive collector.

use crate::prelude::*;
use arx_core::scan::ScanMode;
use arx_core::stage::StageState;
use arx_core::target::TargetKind;

const CONFIG: &str = r#"
[subdomain_discovery]
enabled = true

[subdomain_discovery.passive_tools.collector]
command = "printf 'api.example.com\nmail.example.com\n' > ${output_file}"
"#;

#[tokio::test]
async fn full_discovery_persists_assets_snapshots_and_counts() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    let scan = platform.run_scan(&target_id, CONFIG, ScanMode::Full).await;
    assert_completed(&scan);
    assert_eq!(scan.progress, 100);
    assert_eq!(
        platform.stage_state(&scan, "subdomain_discovery"),
        StageState::Completed
    );

    // Two asset rows under the target.
    for name in ["api.example.com", "mail.example.com"] {
        assert!(
            platform
                .stores
                .assets
                .get_subdomain(&target_id, name)
                .unwrap()
                .is_some(),
            "missing subdomain {name}"
        );
    }

    // Two snapshot rows bound to the scan, and the cached count agrees.
    assert_eq!(
        platform
            .stores
            .snapshots
            .counts_for_scan(&scan.id)
            .unwrap()
            .subdomains,
        2
    );
    assert_eq!(scan.counts.subdomains, 2);
    assert!(scan.stopped_at_ms.is_some());
    assert!(scan.worker_id.is_some());
    assert_eq!(scan.container_ids.len(), 1);
}

#[tokio::test]
async fn rerunning_discovery_does_not_duplicate_assets() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    let first = platform.run_scan(&target_id, CONFIG, ScanMode::Full).await;
    assert_completed(&first);
    let second = platform.run_scan(&target_id, CONFIG, ScanMode::Full).await;
    assert_completed(&second);

    // Upsert-by-natural-key: still two asset rows.
    assert_eq!(
        platform
            .stores
            .assets
            .counts_for_target(&target_id)
            .unwrap()
            .subdomains,
        2
    );
    // Each scan owns its own snapshot rows.
    assert_eq!(
        platform
            .stores
            .snapshots
            .counts_for_scan(&second.id)
            .unwrap()
            .subdomains,
        2
    );
}

#[tokio::test]
async fn discovery_is_skipped_for_ip_targets() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "203.0.113.9", TargetKind::Ip);

    let scan = platform.run_scan(&target_id, CONFIG, ScanMode::Full).await;
    assert_completed(&scan);
    assert_eq!(
        platform.stage_state(&scan, "subdomain_discovery"),
        StageState::Skipped
    );
    assert_eq!(scan.counts.subdomains, 0);
}
