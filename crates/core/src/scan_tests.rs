// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::stage::StageState;

fn scan_with_stages(stages: &[(&str, StageState)]) -> Scan {
    Scan {
        id: ScanId::new("s1"),
        target_id: TargetId::new("t1"),
        engine_ids: Vec::new(),
        engine_names: Vec::new(),
        config_text: String::new(),
        mode: ScanMode::Full,
        status: ScanStatus::Initiated,
        created_at_ms: 0,
        stopped_at_ms: None,
        worker_id: None,
        results_dir: PathBuf::from("/tmp/scan_s1"),
        container_ids: Vec::new(),
        error_message: String::new(),
        progress: 0,
        current_stage: String::new(),
        stage_progress: stages
            .iter()
            .map(|(name, status)| StageProgress {
                name: name.to_string(),
                status: *status,
            })
            .collect(),
        counts: ScanCounts::default(),
        stats_updated_at_ms: None,
        deleted_at_ms: None,
    }
}

#[yare::parameterized(
    initiated_to_running   = { ScanStatus::Initiated, ScanStatus::Running,   true },
    initiated_to_failed    = { ScanStatus::Initiated, ScanStatus::Failed,    true },
    initiated_to_cancelled = { ScanStatus::Initiated, ScanStatus::Cancelled, true },
    running_to_completed   = { ScanStatus::Running,   ScanStatus::Completed, true },
    running_to_failed      = { ScanStatus::Running,   ScanStatus::Failed,    true },
    running_to_cancelled   = { ScanStatus::Running,   ScanStatus::Cancelled, true },
    running_to_initiated   = { ScanStatus::Running,   ScanStatus::Initiated, false },
    completed_is_sticky    = { ScanStatus::Completed, ScanStatus::Running,   false },
    failed_is_sticky       = { ScanStatus::Failed,    ScanStatus::Running,   false },
    cancelled_is_sticky    = { ScanStatus::Cancelled, ScanStatus::Completed, false },
    self_transition        = { ScanStatus::Running,   ScanStatus::Running,   false },
)]
fn status_transitions(from: ScanStatus, to: ScanStatus, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[test]
fn terminal_states() {
    assert!(!ScanStatus::Initiated.is_terminal());
    assert!(!ScanStatus::Running.is_terminal());
    assert!(ScanStatus::Completed.is_terminal());
    assert!(ScanStatus::Failed.is_terminal());
    assert!(ScanStatus::Cancelled.is_terminal());
}

#[test]
fn progress_counts_completed_stages_only() {
    let mut scan = scan_with_stages(&[
        ("subdomain_discovery", StageState::Completed),
        ("port_scan", StageState::Failed),
        ("site_scan", StageState::Completed),
        ("url_fetch", StageState::Pending),
    ]);
    scan.recompute_progress();
    assert_eq!(scan.progress, 50);
}

#[test]
fn progress_is_zero_without_stages() {
    let mut scan = scan_with_stages(&[]);
    scan.recompute_progress();
    assert_eq!(scan.progress, 0);
}

#[test]
fn progress_reaches_hundred() {
    let mut scan = scan_with_stages(&[
        ("site_scan", StageState::Completed),
        ("vuln_scan", StageState::Completed),
    ]);
    scan.recompute_progress();
    assert_eq!(scan.progress, 100);
}

#[test]
fn stage_mut_finds_by_name() {
    let mut scan = scan_with_stages(&[("port_scan", StageState::Pending)]);
    scan.stage_mut("port_scan").unwrap().status = StageState::Running;
    assert_eq!(scan.stage_progress[0].status, StageState::Running);
    assert!(scan.stage_mut("nope").is_none());
}

#[test]
fn scan_serde_round_trip() {
    let scan = scan_with_stages(&[("site_scan", StageState::Running)]);
    let json = serde_json::to_string(&scan).unwrap();
    let back: Scan = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, scan.id);
    assert_eq!(back.stage_progress, scan.stage_progress);
    assert_eq!(back.status, ScanStatus::Initiated);
}
