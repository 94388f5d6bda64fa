//! Scenario: the directory stage fans out over sites and survives one
//! site timing out.

use crate::prelude::*;
use arx_core::asset::WebSite;
use arx_core::scan::ScanMode;
use arx_core::stage::StageState;
use arx_core::target::TargetKind;
use arx_storage::MergeMode;

fn seed_sites(platform: &Platform, target_id: &arx_core::target::TargetId, count: usize) {
    for i in 0..count {
        platform
            .stores
            .assets
            .upsert_websites(
                &[WebSite {
                    target_id: target_id.clone(),
                    url: format!("https://site{i}.example.com"),
                    ..WebSite::default()
                }],
                MergeMode::Overwrite,
            )
            .unwrap();
    }
}

#[tokio::test]
async fn ten_sites_one_timeout_nine_succeed() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    seed_sites(&platform, &target_id, 10);

    // Site 7 hangs past its per-URL timeout; the rest answer instantly.
    let config = r#"
[directory_scan]
enabled = true

[directory_scan.tools.dir_bruteforcer]
command = "case '${url}' in *site7*) sleep 30 ;; *) printf '{\"url\":\"${url}/admin/\",\"status\":403}\n' ;; esac"
max_workers = 5
timeout = 1
"#;
    let scan = platform.run_scan(&target_id, config, ScanMode::Full).await;
    assert_completed(&scan);
    assert_eq!(
        platform.stage_state(&scan, "directory_scan"),
        StageState::Completed
    );

    // Nine directory rows landed; site 7 contributed nothing.
    assert_eq!(scan.counts.directories, 9);
    let progress = scan
        .stage_progress
        .iter()
        .find(|s| s.name == "directory_scan")
        .unwrap();
    assert_eq!(progress.status, StageState::Completed);
}

#[tokio::test]
async fn fanout_respects_max_workers() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    seed_sites(&platform, &target_id, 6);

    // Every invocation records its own start marker; with a pool of 2
    // and a 300ms tool, 6 sites need at least 3 rounds (~900ms). A
    // violation (all 6 at once) would finish in ~300ms.
    let config = r#"
[directory_scan]
enabled = true

[directory_scan.tools.dir_bruteforcer]
command = "sleep 0.3; printf '{\"url\":\"${url}/x/\",\"status\":200}\n'"
max_workers = 2
timeout = 10
"#;
    let started = std::time::Instant::now();
    let scan = platform.run_scan(&target_id, config, ScanMode::Full).await;
    assert_completed(&scan);
    assert!(
        started.elapsed() >= std::time::Duration::from_millis(850),
        "pool bound not respected: {:?}",
        started.elapsed()
    );
    assert_eq!(scan.counts.directories, 6);
}
