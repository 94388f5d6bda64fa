// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target rows and name normalization.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a scan target.
    #[derive(Default)]
    pub struct TargetId;
}

/// What kind of thing a target names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Domain,
    Ip,
    Cidr,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Domain => write!(f, "domain"),
            TargetKind::Ip => write!(f, "ip"),
            TargetKind::Cidr => write!(f, "cidr"),
        }
    }
}

/// Raised when a target name fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidTarget {
    #[error("empty target name")]
    Empty,
    #[error("domain contains non-ASCII characters: {0}")]
    NonAscii(String),
    #[error("malformed domain: {0}")]
    MalformedDomain(String),
}

/// The unit of work: a domain, single IP, or CIDR block.
///
/// A target exclusively owns its asset rows; soft-deleting the target
/// cascades to them at the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    pub kind: TargetKind,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scanned_at_ms: Option<u64>,
    /// Soft-delete timestamp (None means live).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at_ms: Option<u64>,
}

impl Target {
    pub fn new(id: TargetId, name: impl Into<String>, kind: TargetKind, created_at_ms: u64) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            created_at_ms,
            last_scanned_at_ms: None,
            deleted_at_ms: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at_ms.is_some()
    }
}

/// Normalize a DOMAIN target name: trim whitespace, strip one trailing dot,
/// lowercase ASCII. Non-ASCII input is rejected rather than IDNA-mapped;
/// punycode labels pass through unchanged.
///
/// Both the lifecycle create path and the subdomain stage route names
/// through here so downstream uniqueness sees a single spelling.
pub fn normalize_domain(raw: &str) -> Result<String, InvalidTarget> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidTarget::Empty);
    }
    if !trimmed.is_ascii() {
        return Err(InvalidTarget::NonAscii(trimmed.to_string()));
    }
    let stripped = trimmed.strip_suffix('.').unwrap_or(trimmed);
    let lowered = stripped.to_ascii_lowercase();
    validate_domain(&lowered)?;
    Ok(lowered)
}

/// Validate a normalized domain: dot-separated labels of alphanumerics,
/// hyphens, and underscores, no label empty or longer than 63 bytes.
fn validate_domain(domain: &str) -> Result<(), InvalidTarget> {
    if domain.is_empty() || domain.len() > 253 {
        return Err(InvalidTarget::MalformedDomain(domain.to_string()));
    }
    for label in domain.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(InvalidTarget::MalformedDomain(domain.to_string()));
        }
        let ok = label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !ok {
            return Err(InvalidTarget::MalformedDomain(domain.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
