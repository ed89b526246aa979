//! Evaluation policy for record filters.
//!
//! Configuration can be built in code, read from a JSON file, or taken from
//! environment variables:
//!
//! ```json
//! { "missing_reference": "skip", "text_ordering": true }
//! ```
//!
//! | Variable                   | Values            | Default |
//! |----------------------------|-------------------|---------|
//! | `DICTQL_MISSING_REFERENCE` | `abort` \| `skip` | `abort` |
//! | `DICTQL_TEXT_ORDERING`     | `true` \| `false` | `false` |

use crate::types::{QueryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const ENV_MISSING_REFERENCE: &str = "DICTQL_MISSING_REFERENCE";
pub const ENV_TEXT_ORDERING: &str = "DICTQL_TEXT_ORDERING";

/// What bulk filtering does when a record fails to evaluate.
///
/// Applies to per-record errors only (`UnrecognisedReference`,
/// `TypeMismatch`); single-record calls always return the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingReferencePolicy {
    /// Stop at the first failing record and return its error
    #[default]
    Abort,
    /// Drop the failing record and keep going
    Skip,
}

impl MissingReferencePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for MissingReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingReferencePolicy {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(QueryError::ConfigError(format!(
                "Unknown missing reference policy '{}', expected 'abort' or 'skip'",
                other
            ))),
        }
    }
}

/// Filter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Error policy for bulk filtering
    pub missing_reference: MissingReferencePolicy,

    /// Allow `<`, `<=`, `>`, `>=` between two strings (lexicographic).
    /// When off, ordering non-numeric operands is a type mismatch.
    pub text_ordering: bool,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_reference(mut self, policy: MissingReferencePolicy) -> Self {
        self.missing_reference = policy;
        self
    }

    pub fn with_text_ordering(mut self, enabled: bool) -> Self {
        self.text_ordering = enabled;
        self
    }

    /// Parse configuration from JSON text. Missing keys take their defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| QueryError::ConfigError(format!("Invalid config: {}", e)))
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Io` if the file cannot be read, or
    /// `QueryError::ConfigError` if it is not a valid configuration
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build configuration from `DICTQL_*` environment variables over defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_MISSING_REFERENCE) {
            config.missing_reference = value.parse()?;
        }
        if let Some(value) = lookup(ENV_TEXT_ORDERING) {
            config.text_ordering = parse_flag(ENV_TEXT_ORDERING, &value)?;
        }
        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(QueryError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
