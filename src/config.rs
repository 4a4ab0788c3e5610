//! Runtime configuration.
//!
//! Every key has a default, so an empty file (or no file) is a valid
//! configuration. The `model` table is opaque to the effect engine and is
//! only handed to the mask provider factory.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 20 * 1024 * 1024;
pub const DEFAULT_MAX_REQUESTS_PER_USER_PER_MINUTE: u32 = 5;
pub const DEFAULT_PROCESSING_TIMEOUT_SECONDS: u64 = 60;

/// Segmentation model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelMode {
    #[default]
    Base,
    Fast,
    BaseNightly,
}

impl fmt::Display for ModelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Base => "base",
            Self::Fast => "fast",
            Self::BaseNightly => "base-nightly",
        })
    }
}

/// How the model resizes its input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeMode {
    #[default]
    Static,
    Dynamic,
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        })
    }
}

/// Mask provider initialization parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub mode: ModelMode,
    pub use_jit: bool,
    pub resize_mode: ResizeMode,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            mode: ModelMode::Base,
            use_jit: true,
            resize_mode: ResizeMode::Static,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_file_size_bytes: u64,
    pub max_requests_per_user_per_minute: u32,
    pub processing_timeout_seconds: u64,
    pub model: ModelOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_requests_per_user_per_minute: DEFAULT_MAX_REQUESTS_PER_USER_PER_MINUTE,
            processing_timeout_seconds: DEFAULT_PROCESSING_TIMEOUT_SECONDS,
            model: ModelOptions::default(),
        }
    }
}

impl Config {
    /// Reads and validates a TOML configuration file
    ///
    /// # Errors
    ///
    /// * `ConfigError::Io` - When the file cannot be read
    /// * `ConfigError::Parse` - When the contents are not valid TOML for this schema
    /// * `ConfigError::Invalid` - When a limit is zero
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_file_size_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_requests_per_user_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "max_requests_per_user_per_minute must be greater than zero".to_string(),
            ));
        }
        if self.processing_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "processing_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_seconds)
    }
}
