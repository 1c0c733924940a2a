//! Process configuration.
//!
//! Loaded once at startup from a JSON file; every section has defaults so an
//! empty object is a valid configuration (include every index, talk to
//! `http://localhost:9200`, take the index from the request).

use crate::{
    ApiConfig, ConfigError, ConnectionConfig, DepthLimitValidator, HttpClientFactory, IndexPolicy, RegistryConfig,
    Result, SchemaRegistry,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Index include/exclude policy and per-index field limits
    #[serde(default)]
    pub index: RegistryConfig,

    /// Search-engine connection
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// `accept_index_param` / `default_index`
    #[serde(flatten)]
    pub api: ApiConfig,

    /// Reject expressions nested deeper than this
    #[serde(default)]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("can't read {}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> std::result::Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Startup checks; any failure is fatal
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        IndexPolicy::from_sets(
            self.index.include_indices.iter().cloned(),
            self.index.exclude_indices.iter().cloned(),
        )?;
        self.api.validate()?;
        if self.connection.hosts.is_empty() {
            return Err(ConfigError::Invalid("connection.hosts must not be empty".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Registry talking to the configured engine over HTTP
    pub fn build_registry(&self) -> Result<SchemaRegistry> {
        self.validate()?;
        let factory = Arc::new(HttpClientFactory::new(self.connection.clone()));
        let registry = SchemaRegistry::new(&self.index, factory)?;
        Ok(match self.max_depth {
            Some(max_depth) => registry.with_default_validator(Arc::new(DepthLimitValidator::new(max_depth))),
            None => registry,
        })
    }
}
