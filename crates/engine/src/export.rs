// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Export task: drain a provider iterator chain into a file.
//!
//! Sources are tried in order; the first one that yields at least one
//! surviving line wins. One deliberate wrinkle: when a source produced
//! rows but the blacklist removed every one of them, the chain stops
//! there with zero lines instead of falling through. Falling back would
//! re-include exactly what the operator excluded.

use crate::error::EngineError;
use crate::provider::{TargetIter, TargetProvider};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One element of an export fall-back chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSource {
    Endpoints,
    Websites,
    HostPorts,
    Subdomains,
    /// Subdomain names expanded to `http://` and `https://` URLs, for
    /// stages that need probe URLs before any port scan has run.
    SubdomainUrls,
    Default,
}

impl fmt::Display for ExportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportSource::Endpoints => write!(f, "endpoints"),
            ExportSource::Websites => write!(f, "websites"),
            ExportSource::HostPorts => write!(f, "host_ports"),
            ExportSource::Subdomains => write!(f, "subdomains"),
            ExportSource::SubdomainUrls => write!(f, "subdomain_urls"),
            ExportSource::Default => write!(f, "default"),
        }
    }
}

/// Result of an export run.
#[derive(Debug)]
pub struct ExportOutcome {
    pub output_file: PathBuf,
    /// Lines written to the file.
    pub written: u64,
    /// Rows the winning source produced before filtering.
    pub raw: u64,
    /// Rows the blacklist removed from the winning source.
    pub filtered: u64,
    /// The source that settled the chain; None when every source was empty.
    pub source: Option<ExportSource>,
    pub tried: Vec<ExportSource>,
}

impl ExportOutcome {
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }
}

fn iter_for(provider: &dyn TargetProvider, source: ExportSource) -> TargetIter {
    match source {
        ExportSource::Endpoints => provider.endpoints(),
        ExportSource::Websites => provider.websites(),
        ExportSource::HostPorts => provider.host_port_urls(),
        ExportSource::Subdomains => provider.subdomains(),
        ExportSource::SubdomainUrls => provider.subdomains().flat_map_values(|name| {
            vec![format!("http://{name}"), format!("https://{name}")]
        }),
        ExportSource::Default => provider.default_urls(),
    }
}

/// Walk `sources` in order, writing the first non-empty source to
/// `out_path`. The file is created (and truncated) even when nothing is
/// written, so tools always see a file.
pub fn export_targets(
    provider: &dyn TargetProvider,
    sources: &[ExportSource],
    out_path: &Path,
) -> Result<ExportOutcome, EngineError> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tried = Vec::new();
    for &source in sources {
        tried.push(source);
        let mut iter = iter_for(provider, source);

        let file = File::create(out_path)?;
        let mut writer = BufWriter::new(file);
        let mut written = 0u64;
        while let Some(value) = iter.next_value()? {
            writer.write_all(value.as_bytes())?;
            writer.write_all(b"\n")?;
            written += 1;
        }
        writer.flush()?;
        let raw = iter.raw_count();
        let filtered = iter.filtered_count();
        iter.close();

        if written > 0 {
            info!(%source, written, raw, filtered, file = %out_path.display(), "export complete");
            return Ok(ExportOutcome {
                output_file: out_path.to_path_buf(),
                written,
                raw,
                filtered,
                source: Some(source),
                tried,
            });
        }
        if raw > 0 {
            // Everything this source had was blacklisted; do not fall
            // through to a broader source.
            warn!(%source, raw, filtered, "source fully blacklisted, stopping chain");
            return Ok(ExportOutcome {
                output_file: out_path.to_path_buf(),
                written: 0,
                raw,
                filtered,
                source: Some(source),
                tried,
            });
        }
        info!(%source, "source empty, trying next");
    }

    warn!(file = %out_path.display(), "every export source was empty");
    Ok(ExportOutcome {
        output_file: out_path.to_path_buf(),
        written: 0,
        raw: 0,
        filtered: 0,
        source: None,
        tried,
    })
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
