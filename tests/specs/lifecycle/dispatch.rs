//! Lifecycle: worker selection and dispatch failure handling.

use crate::prelude::*;
use arx_core::scan::{ScanMode, ScanStatus};
use arx_core::target::TargetKind;
use arx_core::worker::WorkerId;

const CONFIG: &str = r#"
[subdomain_discovery]
enabled = true

[subdomain_discovery.passive_tools.collector]
command = "printf 'api.example.com\n' > ${output_file}"
"#;

#[tokio::test]
async fn least_loaded_worker_gets_the_scan() {
    let platform = Platform::start(); // registers w1 at 5/5
    platform.add_worker("w2", 90.0, 80.0);
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    let scan = platform.run_scan(&target_id, CONFIG, ScanMode::Full).await;
    assert_completed(&scan);
    assert_eq!(scan.worker_id, Some(WorkerId::new("w1")));
}

#[tokio::test]
async fn scan_fails_when_every_worker_is_offline() {
    let platform = Platform::start();
    // Expire the only worker's heartbeat.
    platform
        .clock
        .advance(arx_storage::HEARTBEAT_TTL_MS + 1);
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    let scan = platform.run_scan(&target_id, CONFIG, ScanMode::Full).await;
    assert_eq!(scan.status, ScanStatus::Failed);
    assert!(scan.error_message.contains("no online workers"));
    // The scan never touched RUNNING: no stage ever started.
    assert!(scan.stage_progress.is_empty());
}

#[tokio::test]
async fn multi_target_creation_yields_one_scan_each() {
    let platform = Platform::start();
    let t1 = platform.create_target("t1", "one.example.com", TargetKind::Domain);
    let t2 = platform.create_target("t2", "two.example.com", TargetKind::Domain);

    let created = platform
        .lifecycle
        .create_scans(
            &[t1, t2],
            vec!["engine-1".to_string()],
            vec!["Spec Engine".to_string()],
            &[CONFIG.to_string()],
            ScanMode::Full,
        )
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_ne!(created[0].results_dir, created[1].results_dir);

    for scan in created {
        let settled = platform.wait_terminal(&scan.id).await;
        assert_completed(&settled);
    }
}

#[tokio::test]
async fn engine_merge_is_stored_on_the_scan() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    let extra = r#"
[screenshot]
enabled = true

[screenshot.tools.renderer]
command = "touch ${output_file}"
"#;
    let created = platform
        .lifecycle
        .create_scans(
            std::slice::from_ref(&target_id),
            vec!["e1".to_string(), "e2".to_string()],
            vec!["One".to_string(), "Two".to_string()],
            &[CONFIG.to_string(), extra.to_string()],
            ScanMode::Full,
        )
        .unwrap();

    let scan = platform.wait_terminal(&created[0].id).await;
    assert_completed(&scan);
    // Both engines' stages ran from the merged config.
    assert_eq!(scan.stage_progress.len(), 2);
    assert!(scan.config_text.contains("subdomain_discovery"));
    assert!(scan.config_text.contains("screenshot"));
}
