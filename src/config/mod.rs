//! Configuration module for tickgraph
//!
//! This module handles engine configuration:
//! - Buffer pool budget and bucket depth
//! - Scheduler tick rate and cycle policy
//! - Logging filter
//!
//! Configuration is stored as TOML. Every section and field is optional;
//! anything missing falls back to its default.
//!
//! # Example
//!
//! ```ignore
//! use tickgraph::config::EngineConfig;
//!
//! let config = EngineConfig::load_or_default("tickgraph.toml");
//! tickgraph::logging::init_tracing(&config.logging)?;
//! let mut engine = tickgraph::Engine::new(config);
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{EngineError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional configuration filename
pub const CONFIG_FILE: &str = "tickgraph.toml";

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Buffer pool settings
    pub pool: PoolConfig,

    /// Scheduler settings
    pub scheduler: SchedulerConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this configuration to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(EngineError::from)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Load a configuration file, returning defaults if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load engine config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    EngineError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))
    }

    /// Check that the configuration describes a usable engine
    pub fn validate(&self) -> Result<()> {
        if self.pool.budget_bytes == 0 {
            return Err(EngineError::Config(
                "pool.budget_bytes must be greater than zero".to_string(),
            ));
        }
        if self.pool.max_bucket_depth == 0 {
            return Err(EngineError::Config(
                "pool.max_bucket_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
