//! Lifecycle: cooperative stop and two-phase delete.

use crate::prelude::*;
use arx_core::scan::{ScanMode, ScanStatus};
use arx_core::stage::StageState;
use arx_core::target::TargetKind;
use std::time::Duration;

#[tokio::test]
async fn stop_mid_scan_cancels_remaining_stages_and_keeps_records() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    // Discovery finishes fast and writes rows; the port scan then hangs
    // long enough for stop_scan to land at a stage boundary.
    let config = r#"
[subdomain_discovery]
enabled = true

[subdomain_discovery.passive_tools.collector]
command = "printf 'api.example.com\n' > ${output_file}"

[port_scan]
enabled = true

[port_scan.tools.port_scanner]
command = "cat ${input_file} >/dev/null; sleep 30"
timeout = 60

[site_scan]
enabled = true

[site_scan.tools.http_prober]
command = "cat ${input_file}"
"#;
    let created = platform
        .lifecycle
        .create_scans(
            std::slice::from_ref(&target_id),
            vec!["engine-1".to_string()],
            vec!["Spec Engine".to_string()],
            &[config.to_string()],
            ScanMode::Full,
        )
        .unwrap();
    let scan_id = created[0].id.clone();

    // Wait until the slow stage is running, then stop.
    let started = std::time::Instant::now();
    loop {
        let scan = platform.stores.scans.get(&scan_id).unwrap();
        if scan.current_stage == "port_scan" {
            break;
        }
        assert!(started.elapsed() < Duration::from_secs(20), "port_scan never started");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let stopped = platform.lifecycle.stop_scan(&scan_id).unwrap();
    assert_eq!(stopped.status, ScanStatus::Cancelled);

    let scan = platform.wait_terminal(&scan_id).await;
    assert_eq!(scan.status, ScanStatus::Cancelled);

    // Records from the completed stage survive.
    assert!(platform
        .stores
        .assets
        .get_subdomain(&target_id, "api.example.com")
        .unwrap()
        .is_some());
    assert_eq!(
        platform.stage_state(&scan, "subdomain_discovery"),
        StageState::Completed
    );
    // The never-started stage is cancelled, not pending.
    assert_eq!(platform.stage_state(&scan, "site_scan"), StageState::Cancelled);
}

#[tokio::test]
async fn stop_is_rejected_for_finished_scans() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    let config = r#"
[subdomain_discovery]
enabled = true

[subdomain_discovery.passive_tools.collector]
command = "printf 'api.example.com\n' > ${output_file}"
"#;
    let scan = platform.run_scan(&target_id, config, ScanMode::Full).await;
    assert_completed(&scan);
    assert!(platform.lifecycle.stop_scan(&scan.id).is_err());
}

#[tokio::test]
async fn delete_hides_immediately_and_scrubs_in_background() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    let config = r#"
[subdomain_discovery]
enabled = true

[subdomain_discovery.passive_tools.collector]
command = "printf 'api.example.com\n' > ${output_file}"
"#;
    let scan = platform.run_scan(&target_id, config, ScanMode::Full).await;
    assert_completed(&scan);
    assert!(scan.results_dir.is_dir());

    platform.lifecycle.delete_scans(&[scan.id.clone()]).unwrap();
    // Phase one: invisible to reads right away.
    assert!(platform.stores.scans.get(&scan.id).is_err());

    // Phase two: results directory and snapshot rows go away.
    let started = std::time::Instant::now();
    while scan.results_dir.exists() {
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "results dir never removed"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        platform
            .stores
            .snapshots
            .counts_for_scan(&scan.id)
            .unwrap()
            .subdomains,
        0
    );
}
