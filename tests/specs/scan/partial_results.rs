//! Boundary: a tool timing out after streaming records keeps exactly
//! those records.

use crate::prelude::*;
use arx_core::scan::ScanMode;
use arx_core::stage::StageState;
use arx_core::target::TargetKind;

#[tokio::test]
async fn timeout_after_37_records_persists_exactly_37() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    // Emit 37 probe records quickly, then hang until the timeout kills
    // the process tree.
    let config = r#"
[site_scan]
enabled = true

[site_scan.tools.http_prober]
command = "cat ${input_file} >/dev/null; i=1; while [ $i -le 37 ]; do printf '{\"url\":\"https://h%03d.example.com\"}\n' $i; i=$((i+1)); done; sleep 30"
timeout = 2
"#;
    let scan = platform.run_scan(&target_id, config, ScanMode::Full).await;
    assert_completed(&scan);

    // The stage completed with partial results from the timed-out tool.
    assert_eq!(
        platform.stage_state(&scan, "site_scan"),
        StageState::Completed
    );
    assert_eq!(scan.counts.websites, 37);
    assert_eq!(
        platform
            .stores
            .snapshots
            .counts_for_scan(&scan.id)
            .unwrap()
            .websites,
        37
    );
}

#[tokio::test]
async fn empty_input_stage_skips_and_the_scan_completes() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    // Directory scan with nothing to chew on: blacklist everything so
    // even the default URLs disappear.
    platform
        .stores
        .blacklists
        .set_target_rules(
            &target_id,
            vec![arx_core::blacklist::BlacklistRule::new(
                "example.com",
                arx_core::blacklist::RuleKind::Substring,
            )],
        )
        .unwrap();
    let config = r#"
[directory_scan]
enabled = true

[directory_scan.tools.dir_bruteforcer]
command = "printf ''"
"#;
    let scan = platform.run_scan(&target_id, config, ScanMode::Full).await;
    assert_completed(&scan);
    assert_eq!(
        platform.stage_state(&scan, "directory_scan"),
        StageState::Skipped
    );
    // Progress arithmetic counts completed stages only.
    assert_eq!(scan.progress, 0);
}
