//! YAML configuration for the `gts` binary.
//!
//! # Example YAML
//!
//! ```yaml
//! format: table
//! policy:
//!   - effect: allow
//!     pattern: "gts.x.core.events.type.v1~*"
//!   - effect: deny
//!     pattern: "gts.x.core.events.type.v1~x.core._.audit_event.v1~*"
//! ```

use std::io::BufReader;
use std::path::Path;

use gts_core::{AccessPolicy, PolicyError, PolicyRule};
use serde::Deserialize;
use thiserror::Error;

use crate::output::OutputFormat;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Settings read from `--config`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Output format used when `--format` is not given.
    pub format: Option<OutputFormat>,
    /// Access rules for `gts check`.
    pub policy: Vec<PolicyRule>,
}

impl CliConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read, or
    /// [`ConfigError::YamlError`] if it is not valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Compiles the configured rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Policy`] naming the first invalid rule.
    pub fn access_policy(&self) -> Result<AccessPolicy, ConfigError> {
        Ok(AccessPolicy::compile(&self.policy)?)
    }
}
