//! vsoftmax Configuration Management.
//!
//! Loads the kernel and logging settings used by the `vsoftmax` driver from
//! YAML, TOML, or JSON files, with environment variable overrides.
//!
//! # Example
//!
//! ```rust,ignore
//! use vsoftmax_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_file("vsoftmax.yaml")
//!     .with_env_prefix("VSOFTMAX")
//!     .load()?;
//!
//! println!("Backend: {}", config.kernel.backend);
//! ```

pub mod error;
pub mod loader;
pub mod validation;

pub use error::ConfigError;
pub use loader::{load_default_config, ConfigBuilder, ConfigFormat, ConfigLoader};
pub use validation::validate_config;

use serde::{Deserialize, Serialize};
use validator::Validate;
use vsoftmax_kernels::{Backend, DEFAULT_PORTABLE_LANES};

/// Environment variable prefix used by the driver.
pub const ENV_PREFIX: &str = "VSOFTMAX";

/// Backend name meaning "detect at startup".
pub const AUTO_BACKEND: &str = "auto";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Kernel configuration.
    #[validate(nested)]
    #[serde(default)]
    pub kernel: KernelConfig,

    /// Logging configuration.
    #[validate(nested)]
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load a configuration file (no environment overrides).
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        ConfigLoader::new().with_file(path).load()
    }

    /// Defaults plus `VSOFTMAX_*` environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigLoader::new().with_env_prefix(ENV_PREFIX).load()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        <Self as Validate>::validate(self).map_err(ConfigError::from)?;
        validate_config(self)
    }
}

/// Vector kernel selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct KernelConfig {
    /// `auto`, `portable`, `avx2` or `neon`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Lanes emulated by the portable backend (1..=16, checked by
    /// [`validate_config`]).
    #[serde(default = "default_portable_lanes")]
    pub portable_lanes: usize,

    /// Untimed iterations run before `bench` measures.
    #[serde(default = "default_warmup_iterations")]
    pub warmup_iterations: usize,
}

impl KernelConfig {
    /// The pinned backend, or `None` for auto-detection.
    pub fn backend_choice(&self) -> Result<Option<Backend>, ConfigError> {
        if self.backend.trim().eq_ignore_ascii_case(AUTO_BACKEND) {
            return Ok(None);
        }
        Ok(Some(self.backend.parse()?))
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            portable_lanes: default_portable_lanes(),
            warmup_iterations: default_warmup_iterations(),
        }
    }
}

fn default_backend() -> String {
    AUTO_BACKEND.to_string()
}

fn default_portable_lanes() -> usize {
    DEFAULT_PORTABLE_LANES
}

fn default_warmup_iterations() -> usize {
    10
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level.
    #[validate(length(min = 1))]
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty, compact).
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
