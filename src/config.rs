//! Facade configuration
//!
//! Registry policies (what to do on a duplicate name, how to report handler
//! failures) are chosen here once per facade.

use serde::Deserialize;
use std::path::Path;

/// What a registry does when a name is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Report `MvcError::Duplicate*` and leave the registry unchanged
    #[default]
    Error,
    /// Keep the first registration and return `Ok` without doing anything
    Ignore,
}

/// How handler failures surface from a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Finish the fan-out, then return every failure in one error
    #[default]
    Aggregate,
    /// Log each failure where it happens and report success
    LogAndSwallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub failure_policy: FailurePolicy,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FacadeConfig {
    /// Parse a configuration from a JSON string. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading facade config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
