// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blacklist rules and the compiled filter.
//!
//! Rules apply uniformly to domains, IPs, and URLs; matching is always
//! against the raw string. A value is allowed iff no rule matches, so
//! evaluation order is irrelevant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a rule's pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Exact,
    Suffix,
    Substring,
    Glob,
    Regex,
}

/// One blacklist rule, per-target or global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistRule {
    pub pattern: String,
    pub kind: RuleKind,
}

impl BlacklistRule {
    pub fn new(pattern: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
        }
    }
}

/// Raised when a glob or regex rule fails to compile.
#[derive(Debug, Error)]
pub enum BlacklistError {
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("invalid regex pattern {pattern:?}: {source}")]
    Regex {
        pattern: String,
        source: regex::Error,
    },
}

enum Compiled {
    Exact(String),
    Suffix(String),
    Substring(String),
    Glob(glob::Pattern),
    Regex(regex::Regex),
}

impl Compiled {
    fn matches(&self, value: &str) -> bool {
        match self {
            Compiled::Exact(p) => value == p,
            Compiled::Suffix(p) => value.ends_with(p.as_str()),
            Compiled::Substring(p) => value.contains(p.as_str()),
            Compiled::Glob(p) => p.matches(value),
            Compiled::Regex(p) => p.is_match(value),
        }
    }
}

/// Compiled blacklist filter. Glob and regex patterns are compiled once at
/// construction; invalid patterns are rejected up front rather than being
/// silently skipped at match time.
pub struct BlacklistFilter {
    rules: Vec<Compiled>,
}

impl BlacklistFilter {
    pub fn new(rules: &[BlacklistRule]) -> Result<Self, BlacklistError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let c = match rule.kind {
                RuleKind::Exact => Compiled::Exact(rule.pattern.clone()),
                RuleKind::Suffix => Compiled::Suffix(rule.pattern.clone()),
                RuleKind::Substring => Compiled::Substring(rule.pattern.clone()),
                RuleKind::Glob => Compiled::Glob(glob::Pattern::new(&rule.pattern).map_err(
                    |source| BlacklistError::Glob {
                        pattern: rule.pattern.clone(),
                        source,
                    },
                )?),
                RuleKind::Regex => Compiled::Regex(regex::Regex::new(&rule.pattern).map_err(
                    |source| BlacklistError::Regex {
                        pattern: rule.pattern.clone(),
                        source,
                    },
                )?),
            };
            compiled.push(c);
        }
        Ok(Self { rules: compiled })
    }

    /// An empty filter allows everything.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True iff no rule matches `value`.
    pub fn is_allowed(&self, value: &str) -> bool {
        !self.rules.iter().any(|r| r.matches(value))
    }
}

#[cfg(test)]
#[path = "blacklist_tests.rs"]
mod tests;
