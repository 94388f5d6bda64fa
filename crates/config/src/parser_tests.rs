// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const FULL_CONFIG: &str = r#"
[subdomain_discovery]
enabled = true

[subdomain_discovery.passive_tools.subfinder]
command = "subfinder -d ${domain} -o ${output_file}"
timeout = "auto"

[subdomain_discovery.passive_tools.passive2]
command = "collector -d ${domain} -o ${output_file}"
timeout = 600

[subdomain_discovery.bruteforce]
enabled = true

[subdomain_discovery.bruteforce.tools.subdomain_bruteforce]
command = "brute -d ${domain} -w ${wordlist} -o ${output_file}"
wordlist_name = "dns_wordlist.txt"
timeout = "auto"

[port_scan]
enabled = true

[port_scan.tools.port_scanner]
command = "pscan -l ${input_file} -o ${output_file}"
ports = "80,443,8000-8100"
timeout = "auto"

[site_scan]
enabled = true

[site_scan.tools.http_prober]
command = "prober -l ${input_file} -json"

[directory_scan]
enabled = true

[directory_scan.tools.dir_bruteforcer]
command = "dirb -u ${url} -w ${wordlist}"
wordlist_name = "dir_wordlist.txt"
max_workers = 5

[url_fetch]
enabled = true

[url_fetch.domain_tools.url_collector]
command = "urls -d ${domain} -o ${output_file}"

[url_fetch.site_tools.crawler]
command = "crawl -l ${input_file}"
concurrency = 10
"#;

#[test]
fn parses_a_full_config() {
    let config = parse_engine_config(FULL_CONFIG).unwrap();
    let sub = config.subdomain_discovery.as_ref().unwrap();
    assert!(sub.enabled);
    assert_eq!(sub.passive_tools.len(), 2);
    assert!(sub.bruteforce.as_ref().unwrap().enabled);
    assert!(sub.permutation.is_none());

    let port = config.port_scan.as_ref().unwrap();
    let (_, scanner) = port.enabled_tools().next().unwrap();
    assert_eq!(scanner.port_count(), 103);
}

#[test]
fn tool_order_is_preserved() {
    let config = parse_engine_config(FULL_CONFIG).unwrap();
    let names: Vec<&String> = config
        .subdomain_discovery
        .as_ref()
        .unwrap()
        .passive_tools
        .keys()
        .collect();
    assert_eq!(names, vec!["subfinder", "passive2"]);
}

#[test]
fn unknown_stage_section_is_rejected() {
    let err = parse_engine_config("[warp_scan]\nenabled = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn unknown_tool_option_is_rejected() {
    let text = r#"
[site_scan]
enabled = true
[site_scan.tools.prober]
command = "prober"
banana = 3
"#;
    assert!(parse_engine_config(text).is_err());
}

#[test]
fn empty_command_is_rejected() {
    let text = r#"
[site_scan]
enabled = true
[site_scan.tools.prober]
command = "  "
"#;
    let err = parse_engine_config(text).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTool { .. }));
}

#[test]
fn enabled_stage_without_tools_is_rejected() {
    let err = parse_engine_config("[site_scan]\nenabled = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidStage { .. }));
}

#[test]
fn zero_max_workers_is_rejected() {
    let text = r#"
[directory_scan]
enabled = true
[directory_scan.tools.dirb]
command = "dirb -u ${url}"
max_workers = 0
"#;
    assert!(parse_engine_config(text).is_err());
}

#[test]
fn disabled_stage_without_tools_is_fine() {
    parse_engine_config("[site_scan]\nenabled = false\n").unwrap();
}

#[test]
fn empty_document_parses() {
    let config = parse_engine_config("").unwrap();
    assert!(config.enabled_stages().is_empty());
}
