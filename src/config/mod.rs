// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{ExtractError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. Environment variables (`GEMEXTRACT_` prefix, `__` between nested keys)
    /// 3. Config file (`path`, or `~/.gemextract/config.toml` when absent)
    /// 4. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_source = match path {
            Some(path) => File::from(path).required(true),
            None => File::from(Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file_source)
            .add_source(
                Environment::with_prefix("GEMEXTRACT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ExtractError::Config(e.to_string()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| ExtractError::Config(e.to_string()))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings that would only fail later at runtime.
    pub fn validate(&self) -> Result<()> {
        let ttl = self.cache.default_ttl_hours;
        if !ttl.is_finite() || ttl < 0.0 {
            return Err(ExtractError::Config(format!(
                "cache.default_ttl_hours must be a finite non-negative number, got {}",
                ttl
            )));
        }

        self.pricing
            .validate()
            .map_err(|e| ExtractError::Config(e.to_string()))
    }

    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gemextract")
            .join("config.toml")
    }
}
