//! Dispatch configuration.
//!
//! Values are read from JSON and may be overridden by `FIELDOPS_*`
//! environment variables.

use crate::task::services::{MessageTemplate, default_templates};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Environment variable overriding the field supervisor role identifier.
pub const ENV_FIELD_SUPERVISOR_ROLE_ID: &str = "FIELDOPS_FIELD_SUPERVISOR_ROLE_ID";
/// Environment variable overriding the back-office verifier role identifier.
pub const ENV_CGP_ROLE_ID: &str = "FIELDOPS_CGP_ROLE_ID";
/// Environment variable overriding the cascade depth limit.
pub const ENV_MAX_CASCADE_DEPTH: &str = "FIELDOPS_MAX_CASCADE_DEPTH";
/// Environment variable overriding the log filter.
pub const ENV_LOG_FILTER: &str = "FIELDOPS_LOG_FILTER";

const DEFAULT_MAX_CASCADE_DEPTH: usize = 4;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Role identifier of field supervisors.
    pub field_supervisor_role_id: Option<i64>,
    /// Role identifier of back-office verifiers.
    pub cgp_role_id: Option<i64>,
    /// Deepest nesting allowed for cascaded transitions.
    pub max_cascade_depth: usize,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Notification templates keyed by name.
    pub templates: BTreeMap<String, MessageTemplate>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            field_supervisor_role_id: None,
            cgp_role_id: None,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
            log_filter: "info".to_owned(),
            templates: default_templates(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment override could not be parsed.
    #[error("invalid value '{value}' for {key}")]
    InvalidOverride {
        /// Variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },
}

impl DispatchConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Applies `FIELDOPS_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for unparsable values.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for unparsable values.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_FIELD_SUPERVISOR_ROLE_ID) {
            self.field_supervisor_role_id = Some(parse_override(ENV_FIELD_SUPERVISOR_ROLE_ID, value)?);
        }
        if let Some(value) = lookup(ENV_CGP_ROLE_ID) {
            self.cgp_role_id = Some(parse_override(ENV_CGP_ROLE_ID, value)?);
        }
        if let Some(value) = lookup(ENV_MAX_CASCADE_DEPTH) {
            self.max_cascade_depth = parse_override(ENV_MAX_CASCADE_DEPTH, value)?;
        }
        if let Some(value) = lookup(ENV_LOG_FILTER) {
            self.log_filter = value;
        }
        Ok(self)
    }
}

fn parse_override<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { key, value })
}
