//! # Lookup Configuration
//!
//! Settings for the external variant lookup, read from an optional TOML file.
//! Every key has a default, so an empty file (or no file at all) gives a working
//! setup against the public MyVariant.info service.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// The public MyVariant.info batch query endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://myvariant.info/v1/query";
/// Identifiers are reference SNP IDs.
pub const DEFAULT_SCOPES: &str = "dbsnp.rsid";
/// The service refuses batches larger than this.
pub const MAX_BATCH_SIZE: usize = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML configuration file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize configuration to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("The lookup endpoint must not be empty.")]
    EmptyEndpoint,
    #[error("The lookup scopes must not be empty.")]
    EmptyScopes,
    #[error("Batch size must be between 1 and {max}, got {found}.")]
    InvalidBatchSize { found: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    /// URL of the batch query endpoint.
    pub endpoint: String,
    /// Namespace the identifiers are matched against.
    pub scopes: String,
    /// Annotation fields requested for every hit.
    pub fields: Vec<String>,
    /// Identifiers per request.
    pub batch_size: usize,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            scopes: DEFAULT_SCOPES.to_string(),
            // `dbsnp.rsid` is always present on a hit, which keeps the `dbsnp`
            // namespace in the payload even for intergenic variants.
            fields: vec![
                "dbsnp.rsid".to_string(),
                "dbsnp.gene".to_string(),
                "snpeff.ann.genename".to_string(),
            ],
            batch_size: MAX_BATCH_SIZE,
            timeout_secs: 120,
        }
    }
}

impl LookupConfig {
    /// Loads and validates a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let config: LookupConfig = toml::from_str(&toml_string)?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML, e.g. to seed a config file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.scopes.trim().is_empty() {
            return Err(ConfigError::EmptyScopes);
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize {
                found: self.batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(())
    }
}
