//! Scenario: two concurrent scans of one target writing the same
//! website URL converge to one merged asset row.

use crate::prelude::*;
use arx_core::scan::ScanMode;
use arx_core::target::TargetKind;

fn config(title: &str, tech: &str) -> String {
    format!(
        r#"
[site_scan]
enabled = true

[site_scan.tools.http_prober]
command = "cat ${{input_file}} >/dev/null; printf '{{\"url\":\"https://example.com\",\"title\":\"{title}\",\"tech\":[\"{tech}\"]}}\n'"
"#
    )
}

#[tokio::test]
async fn concurrent_scans_union_sets_and_last_write_wins_on_scalars() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);

    let config_a = config("A", "nginx");
    let config_b = config("B", "react");
    let (scan_a, scan_b) = tokio::join!(
        platform.run_scan(&target_id, &config_a, ScanMode::Full),
        platform.run_scan(&target_id, &config_b, ScanMode::Full),
    );
    assert_completed(&scan_a);
    assert_completed(&scan_b);

    // Exactly one asset row exists.
    assert_eq!(
        platform
            .stores
            .assets
            .counts_for_target(&target_id)
            .unwrap()
            .websites,
        1
    );
    let site = platform
        .stores
        .assets
        .get_website(&target_id, "https://example.com")
        .unwrap()
        .unwrap();

    // Set-valued fields are the union of both runs.
    let mut tech = site.tech.clone();
    tech.sort();
    assert_eq!(tech, vec!["nginx".to_string(), "react".to_string()]);
    // Scalar fields hold whichever run committed last.
    assert!(site.title == "A" || site.title == "B");

    // Each scan kept its own snapshot of what it saw.
    for (scan, title) in [(&scan_a, "A"), (&scan_b, "B")] {
        let snaps = platform
            .stores
            .snapshots
            .websites_for_scan(&scan.id)
            .unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].title, title);
    }
}
