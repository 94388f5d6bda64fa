// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::Fixture;
use arx_config::ToolConfig;
use arx_core::scan::ScanMode;
use arx_core::stage::StageState;

fn passive_config(command: &str) -> SubdomainDiscoveryConfig {
    let mut config = SubdomainDiscoveryConfig {
        enabled: true,
        ..SubdomainDiscoveryConfig::default()
    };
    config
        .passive_tools
        .insert("collector".to_string(), ToolConfig::new(command));
    config
}

fn step(command: &str) -> StepConfig {
    let mut step = StepConfig {
        enabled: true,
        ..StepConfig::default()
    };
    step.tools.insert("step_tool".to_string(), ToolConfig::new(command));
    step
}

#[tokio::test]
async fn passive_collection_persists_subdomains() {
    let fx = Fixture::new();
    let config = passive_config(
        r#"printf 'api.example.com\nmail.example.com\n' > ${output_file}"#,
    );
    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();

    assert_eq!(report.state, StageState::Completed);
    assert_eq!(report.records, 2);

    assert!(fx
        .stores
        .assets
        .get_subdomain(&fx.scan.target_id, "api.example.com")
        .unwrap()
        .is_some());
    assert!(fx
        .stores
        .assets
        .get_subdomain(&fx.scan.target_id, "mail.example.com")
        .unwrap()
        .is_some());
    assert_eq!(
        fx.stores.snapshots.counts_for_scan(&fx.scan.id).unwrap().subdomains,
        2
    );
}

#[tokio::test]
async fn ip_targets_are_a_no_op() {
    let fx = Fixture::with_target(TargetKind::Ip, "10.0.0.7", ScanMode::Full);
    let config = passive_config("printf 'x\\n' > ${output_file}");
    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();
    assert_eq!(report.state, StageState::Skipped);
}

#[tokio::test]
async fn out_of_scope_names_are_dropped_at_save() {
    let fx = Fixture::new();
    let config = passive_config(
        r#"printf 'api.example.com\nevil.com\napi.example.com.evil.org\n' > ${output_file}"#,
    );
    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();
    assert_eq!(report.records, 1);
}

#[tokio::test]
async fn parallel_collectors_merge_with_dedup() {
    let fx = Fixture::new();
    let mut config = passive_config(r#"printf 'a.example.com\nb.example.com\n' > ${output_file}"#);
    config.passive_tools.insert(
        "collector2".to_string(),
        ToolConfig::new(r#"printf 'b.example.com\nc.example.com\n' > ${output_file}"#),
    );
    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(report.tools.succeeded.len(), 2);
}

#[tokio::test]
async fn failed_collector_is_recorded_but_not_fatal() {
    let fx = Fixture::new();
    let mut config = passive_config(r#"printf 'a.example.com\n' > ${output_file}"#);
    config
        .passive_tools
        .insert("broken".to_string(), ToolConfig::new("exit 3"));
    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();

    assert_eq!(report.state, StageState::Completed);
    assert_eq!(report.records, 1);
    assert_eq!(report.tools.failed.len(), 1);
}

#[tokio::test]
async fn bruteforce_merges_into_the_passive_set() {
    let fx = Fixture::new();
    let env = fx.env();
    std::fs::create_dir_all(&env.settings.wordlist_dir).unwrap();
    std::fs::write(env.settings.wordlist_dir.join("dns.txt"), "admin\nmail\n").unwrap();

    let mut config = passive_config(r#"printf 'api.example.com\n' > ${output_file}"#);
    let mut brute = step(r#"printf 'admin.example.com\n' > ${output_file}"#);
    if let Some(tool) = brute.tools.get_mut("step_tool") {
        tool.wordlist_name = Some("dns.txt".to_string());
    }
    config.bruteforce = Some(brute);

    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();
    assert_eq!(report.records, 2);
}

#[tokio::test]
async fn bruteforce_without_wordlist_fails_that_step_only() {
    let fx = Fixture::new();
    let mut config = passive_config(r#"printf 'api.example.com\n' > ${output_file}"#);
    let mut brute = step("true");
    if let Some(tool) = brute.tools.get_mut("step_tool") {
        tool.wordlist_name = Some("missing.txt".to_string());
    }
    config.bruteforce = Some(brute);

    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();
    assert_eq!(report.records, 1);
    assert_eq!(report.tools.failed.len(), 1);
}

#[tokio::test]
async fn wildcard_sampling_skips_the_permutation() {
    let fx = Fixture::new();
    let mut config = passive_config(r#"printf 'api.example.com\n' > ${output_file}"#);

    // One seed: sample cap is 100, wildcard threshold 50. The sample
    // resolves 60 names, so permutation must not run.
    let mut permutation = step(r#"touch ${output_file}.ran; printf 'x.example.com\n' > ${output_file}"#);
    if let Some(tool) = permutation.tools.get_mut("step_tool") {
        tool.sample_command =
            Some("seq 60 | sed 's/^/w/;s/$/.example.com/' > ${output_file}".to_string());
    }
    config.permutation = Some(permutation);

    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();

    // Only the passive result survived; the permutation step reported a
    // wildcard failure.
    assert_eq!(report.records, 1);
    assert!(report
        .tools
        .failed
        .iter()
        .any(|f| f.reason.contains("wildcard")));
}

#[tokio::test]
async fn sampling_under_threshold_runs_the_full_permutation() {
    let fx = Fixture::new();
    let mut config = passive_config(r#"printf 'api.example.com\n' > ${output_file}"#);

    let mut permutation = step(r#"printf 'dev-api.example.com\n' > ${output_file}"#);
    if let Some(tool) = permutation.tools.get_mut("step_tool") {
        tool.sample_command =
            Some("printf 'w1.example.com\\n' > ${output_file}".to_string());
    }
    config.permutation = Some(permutation);

    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();
    assert_eq!(report.records, 2);
}

#[tokio::test]
async fn resolve_step_replaces_the_set() {
    let fx = Fixture::new();
    let mut config = passive_config(
        r#"printf 'alive.example.com\ndead.example.com\n' > ${output_file}"#,
    );
    // Only one name resolves.
    config.resolve = Some(step(
        r#"grep alive ${input_file} > ${output_file} || true"#,
    ));

    let env = fx.env();
    let provider = fx.inventory_provider();
    let report = run(&env, &provider, &config).await.unwrap();
    assert_eq!(report.records, 1);
    assert!(fx
        .stores
        .assets
        .get_subdomain(&fx.scan.target_id, "dead.example.com")
        .unwrap()
        .is_none());
}
