// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use assert_cmd::Command;

fn write_engine(dir: &std::path::Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("engine.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn validate_accepts_a_good_config() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = write_engine(
        tmp.path(),
        r#"
[site_scan]
enabled = true

[site_scan.tools.http_prober]
command = "prober -l ${input_file}"
"#,
    );

    let output = Command::cargo_bin("arx")
        .unwrap()
        .args(["validate", "--engine"])
        .arg(&engine)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("site_scan"));
}

#[test]
fn validate_rejects_unknown_stage_sections() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = write_engine(tmp.path(), "[warp_scan]\nenabled = true\n");

    let output = Command::cargo_bin("arx")
        .unwrap()
        .args(["validate", "--engine"])
        .arg(&engine)
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn scan_runs_a_minimal_discovery_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = write_engine(
        tmp.path(),
        r#"
[subdomain_discovery]
enabled = true

[subdomain_discovery.passive_tools.collector]
command = "printf 'api.example.com\n' > ${output_file}"
"#,
    );

    let output = Command::cargo_bin("arx")
        .unwrap()
        .args(["scan", "--target", "example.com", "--kind", "domain"])
        .arg("--engine")
        .arg(&engine)
        .arg("--results-dir")
        .arg(tmp.path().join("results"))
        .timeout(std::time::Duration::from_secs(60))
        .output()
        .unwrap();
    let stdout = stdout_of(&output);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("status=completed"), "stdout: {stdout}");
    assert!(stdout.contains("1 subdomains"), "stdout: {stdout}");
}
