//! Config loading, validation, and environment overrides.

use super::model::Config;
use super::types::parse_bool;
use crate::error::{MachineLockError, Result};
use std::path::{Path, PathBuf};

/// Overrides `store_dir`.
pub const ENV_STORE_DIR: &str = "MACHINE_LOCK_DIR";

/// Overrides `auto_reclaim` (`1/true/yes/on` or `0/false/no/off`).
pub const ENV_AUTO_RECLAIM: &str = "MACHINE_LOCK_AUTO_RECLAIM";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            MachineLockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            MachineLockError::UserError(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            MachineLockError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Resolve the effective config: the file if given (defaults otherwise),
    /// then environment overrides, then validation.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MACHINE_LOCK_DIR` and `MACHINE_LOCK_AUTO_RECLAIM` if set.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var(ENV_STORE_DIR)
            && !dir.trim().is_empty()
        {
            self.store_dir = PathBuf::from(dir);
        }

        if let Ok(value) = std::env::var(ENV_AUTO_RECLAIM) {
            self.auto_reclaim = parse_bool(&value).ok_or_else(|| {
                MachineLockError::UserError(format!(
                    "invalid value for {}: '{}' (expected true/false)",
                    ENV_AUTO_RECLAIM, value
                ))
            })?;
        }

        Ok(())
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<()> {
        if self.store_dir.as_os_str().is_empty() {
            return Err(MachineLockError::UserError(
                "config validation failed: store_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
