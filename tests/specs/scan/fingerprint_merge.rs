//! Scenario: fingerprint detection merges with fill-only-if-empty
//! scalars and unioned tech.

use crate::prelude::*;
use arx_core::asset::WebSite;
use arx_core::scan::ScanMode;
use arx_core::target::TargetKind;
use arx_storage::MergeMode;

const CONFIG: &str = r#"
[fingerprint_detect]
enabled = true

[fingerprint_detect.tools.fingerprinter]
command = "cat ${input_file} >/dev/null; printf '{\"url\":\"https://x/\",\"cms\":\"WordPress, jQuery\",\"title\":\"Home\",\"status_code\":200}\n'"
"#;

#[tokio::test]
async fn detection_fills_empty_fields_and_unions_tech() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    // Existing observation: empty title, NULL status, one tech entry.
    platform
        .stores
        .assets
        .upsert_websites(
            &[WebSite {
                target_id: target_id.clone(),
                url: "https://x/".to_string(),
                title: String::new(),
                tech: vec!["nginx".to_string()],
                ..WebSite::default()
            }],
            MergeMode::Overwrite,
        )
        .unwrap();

    let scan = platform.run_scan(&target_id, CONFIG, ScanMode::Full).await;
    assert_completed(&scan);

    let site = platform
        .stores
        .assets
        .get_website(&target_id, "https://x/")
        .unwrap()
        .unwrap();
    assert_eq!(site.title, "Home");
    assert_eq!(site.status_code, Some(200));
    assert_eq!(
        site.tech,
        vec![
            "nginx".to_string(),
            "WordPress".to_string(),
            "jQuery".to_string()
        ]
    );

    // The snapshot row carries the full parsed record.
    let snaps = platform
        .stores
        .snapshots
        .websites_for_scan(&scan.id)
        .unwrap();
    assert_eq!(snaps.len(), 1);
    assert_eq!(snaps[0].title, "Home");
    assert_eq!(snaps[0].status_code, Some(200));
    assert_eq!(snaps[0].tech, vec!["WordPress", "jQuery"]);
}

#[tokio::test]
async fn populated_fields_survive_detection() {
    let platform = Platform::start();
    let target_id = platform.create_target("t1", "example.com", TargetKind::Domain);
    platform
        .stores
        .assets
        .upsert_websites(
            &[WebSite {
                target_id: target_id.clone(),
                url: "https://x/".to_string(),
                title: "Probed Title".to_string(),
                status_code: Some(301),
                ..WebSite::default()
            }],
            MergeMode::Overwrite,
        )
        .unwrap();

    let scan = platform.run_scan(&target_id, CONFIG, ScanMode::Full).await;
    assert_completed(&scan);

    let site = platform
        .stores
        .assets
        .get_website(&target_id, "https://x/")
        .unwrap()
        .unwrap();
    // Fill-only-if-empty: the probe's values win over the fingerprint.
    assert_eq!(site.title, "Probed Title");
    assert_eq!(site.status_code, Some(301));
    assert_eq!(site.tech, vec!["WordPress", "jQuery"]);
}
