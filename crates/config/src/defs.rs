// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed engine configuration definitions.

use arx_core::stage::StageKind;
use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A tool timeout: a fixed number of seconds, or `"auto"` to derive it
/// from the input size with the per-stage formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutSetting {
    #[default]
    Auto,
    Secs(u64),
}

impl Serialize for TimeoutSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimeoutSetting::Auto => serializer.serialize_str("auto"),
            TimeoutSetting::Secs(n) => serializer.serialize_u64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for TimeoutSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(TimeoutSetting::Secs(n)),
            Raw::Str(s) if s == "auto" => Ok(TimeoutSetting::Auto),
            Raw::Str(other) => Err(D::Error::custom(format!(
                "timeout must be an integer or \"auto\", got {other:?}"
            ))),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One tool's configuration within a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Command template with `${placeholder}` variables.
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutSetting>,
    /// Intra-stage fan-out degree (directory scan).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Tool-internal concurrency, substituted into the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
    /// Tool-internal rate limit, substituted into the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<u32>,
    /// Named wordlist, resolved to a local path and hash-verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wordlist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fingerprint_libs: Vec<String>,
    /// Port spec for port scanners, e.g. `"80,443,8000-8100"`. Feeds the
    /// auto-timeout formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
    /// Wildcard-DNS sampling command for the permutation step. Template
    /// vars: `input_file`, `output_file`, `sample_size`. When absent the
    /// sampling check is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_command: Option<String>,
}

impl ToolConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            enabled: true,
            command: command.into(),
            timeout: None,
            max_workers: None,
            concurrency: None,
            rate: None,
            wordlist_name: None,
            fingerprint_libs: Vec::new(),
            ports: None,
            sample_command: None,
        }
    }

    /// Number of ports named by the `ports` spec. Ranges count their
    /// width; a missing or unparsable spec counts as one port.
    pub fn port_count(&self) -> u64 {
        let Some(spec) = &self.ports else {
            return 1;
        };
        let mut count = 0u64;
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some((lo, hi)) = part.split_once('-') {
                if let (Ok(lo), Ok(hi)) = (lo.trim().parse::<u64>(), hi.trim().parse::<u64>()) {
                    if hi >= lo {
                        count += hi - lo + 1;
                        continue;
                    }
                }
            }
            if part.parse::<u64>().is_ok() {
                count += 1;
            }
        }
        count.max(1)
    }
}

/// A plain stage section: enabled flag plus its tools, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tools: IndexMap<String, ToolConfig>,
}

impl StageConfig {
    /// Tools with `enabled = true`, in declaration order.
    pub fn enabled_tools(&self) -> impl Iterator<Item = (&String, &ToolConfig)> {
        self.tools.iter().filter(|(_, t)| t.enabled)
    }
}

/// An optional sub-step of subdomain discovery (bruteforce, permutation,
/// resolve).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tools: IndexMap<String, ToolConfig>,
}

impl StepConfig {
    /// The single tool a step runs, when the step is enabled.
    pub fn tool(&self) -> Option<(&String, &ToolConfig)> {
        self.tools.iter().find(|(_, t)| t.enabled)
    }
}

/// Subdomain discovery: parallel passive collectors plus three optional
/// sequential steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubdomainDiscoveryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub passive_tools: IndexMap<String, ToolConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bruteforce: Option<StepConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permutation: Option<StepConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve: Option<StepConfig>,
}

/// URL fetch: passive collectors run once per root domain, crawlers run
/// over the sites file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UrlFetchConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub domain_tools: IndexMap<String, ToolConfig>,
    #[serde(default)]
    pub site_tools: IndexMap<String, ToolConfig>,
}

/// The whole engine configuration: one optional section per stage.
/// Unknown section names are a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain_discovery: Option<SubdomainDiscoveryConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_scan: Option<StageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_scan: Option<StageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_fetch: Option<UrlFetchConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_scan: Option<StageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_detect: Option<StageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<StageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vuln_scan: Option<StageConfig>,
}

impl EngineConfig {
    pub fn is_enabled(&self, stage: StageKind) -> bool {
        match stage {
            StageKind::SubdomainDiscovery => self
                .subdomain_discovery
                .as_ref()
                .map(|s| s.enabled)
                .unwrap_or(false),
            StageKind::PortScan => self.port_scan.as_ref().map(|s| s.enabled).unwrap_or(false),
            StageKind::SiteScan => self.site_scan.as_ref().map(|s| s.enabled).unwrap_or(false),
            StageKind::UrlFetch => self.url_fetch.as_ref().map(|s| s.enabled).unwrap_or(false),
            StageKind::DirectoryScan => self
                .directory_scan
                .as_ref()
                .map(|s| s.enabled)
                .unwrap_or(false),
            StageKind::FingerprintDetect => self
                .fingerprint_detect
                .as_ref()
                .map(|s| s.enabled)
                .unwrap_or(false),
            StageKind::Screenshot => self.screenshot.as_ref().map(|s| s.enabled).unwrap_or(false),
            StageKind::VulnScan => self.vuln_scan.as_ref().map(|s| s.enabled).unwrap_or(false),
        }
    }

    /// Enabled stages in canonical pipeline order.
    pub fn enabled_stages(&self) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }
}

#[cfg(test)]
#[path = "defs_tests.rs"]
mod tests;
