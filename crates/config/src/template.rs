// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-template rendering.
//!
//! Tool commands are templates with `${placeholder}` variables
//! (`input_file`, `output_file`, `wordlist`, `url`, `domain`,
//! `concurrency`, `rate`, `timeout`). Rendering fails on a placeholder
//! the caller did not supply, so a typo in an engine config surfaces
//! before anything is spawned.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("constant regex pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder ${{{name}}} in command template")]
    UnknownPlaceholder { name: String },
}

/// Render a command template against the supplied variables.
pub fn render_command(
    template: &str,
    vars: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let mut missing = None;
    let rendered = VAR_PATTERN.replace_all(template, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match vars.get(name) {
            Some(value) => value.clone(),
            None => {
                if missing.is_none() {
                    missing = Some(name.to_string());
                }
                String::new()
            }
        }
    });
    match missing {
        Some(name) => Err(TemplateError::UnknownPlaceholder { name }),
        None => Ok(rendered.into_owned()),
    }
}

/// Convenience builder for the standard template variables.
#[derive(Debug, Default, Clone)]
pub struct CommandVars {
    vars: HashMap<String, String>,
}

impl CommandVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn set_path(self, key: &str, value: &std::path::Path) -> Self {
        let display = value.display().to_string();
        self.set(key, display)
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.vars
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
