//! Scenario: QUICK mode passes data between stages through snapshots.

use crate::prelude::*;
use arx_core::scan::ScanMode;
use arx_core::target::TargetKind;

/// Discovery plus site scan: the prober must see exactly what discovery
/// found in this scan, not the inventory.
fn config(counter_dir: &std::path::Path) -> String {
    format!(
        r#"
[subdomain_discovery]
enabled = true

[subdomain_discovery.passive_tools.collector]
command = "printf 'api.example.com\n' > ${{output_file}}"

[site_scan]
enabled = true

[site_scan.tools.http_prober]
command = "touch {dir}/$$; cat ${{input_file}} >/dev/null; printf '{{\"url\":\"https://api.example.com\",\"status_code\":200,\"title\":\"API\"}}\n'"
"#,
        dir = counter_dir.display()
    )
}

#[tokio::test]
async fn quick_scan_flows_through_snapshots() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    // Seed the inventory with noise the quick scan must NOT see.
    platform
        .stores
        .assets
        .upsert_subdomains(&[arx_core::asset::Subdomain {
            target_id: target_id.clone(),
            name: "stale.example.com".to_string(),
        }])
        .unwrap();

    let counter = invocation_counter_dir(&platform);
    let scan = platform
        .run_scan(&target_id, &config(&counter), ScanMode::Quick)
        .await;
    assert_completed(&scan);

    // Exactly one probe ran, over the snapshot-derived export file.
    assert_eq!(invocation_count(&counter), 1);
    let export = std::fs::read_to_string(scan.results_dir.join("site_scan/urls.txt")).unwrap();
    assert_eq!(export, "http://api.example.com\nhttps://api.example.com\n");

    // The probe result upserts under the target, snapshots under this
    // scan, and quick-mode cached counts come from the snapshots.
    assert!(platform
        .stores
        .assets
        .get_website(&target_id, "https://api.example.com")
        .unwrap()
        .is_some());
    assert_eq!(
        platform
            .stores
            .snapshots
            .counts_for_scan(&scan.id)
            .unwrap()
            .websites,
        1
    );
    assert_eq!(scan.counts.websites, 1);
    assert_eq!(scan.counts.subdomains, 1);
}

#[tokio::test]
async fn quick_scan_round_trips_discovery_output_exactly() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    let counter = invocation_counter_dir(&platform);

    let scan = platform
        .run_scan(&target_id, &config(&counter), ScanMode::Quick)
        .await;
    assert_completed(&scan);

    // The snapshot table holds exactly the records discovery wrote.
    let snaps = platform
        .stores
        .snapshots
        .subdomains_for_scan(&scan.id)
        .unwrap();
    let names: Vec<&str> = snaps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["api.example.com"]);
}
