//! Configuration loader.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::{Config, KernelConfig, LoggingConfig, ENV_PREFIX};

/// File names tried by [`load_default_config`], in order.
pub const DEFAULT_CONFIG_FILES: [&str; 4] =
    ["vsoftmax.yaml", "vsoftmax.yml", "vsoftmax.toml", "vsoftmax.json"];

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &str) -> Option<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("toml") => Some(Self::Toml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    /// Parse content in this format.
    pub fn parse<T: serde::de::DeserializeOwned>(&self, content: &str) -> Result<T, ConfigError> {
        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(ConfigError::from),
            Self::Toml => toml::from_str(content).map_err(ConfigError::from),
            Self::Json => serde_json::from_str(content).map_err(ConfigError::from),
        }
    }
}

/// Configuration loader: a file (or defaults), then environment overrides,
/// then validation.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file_path: Option<String>,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file path.
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Set the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Load the configuration.
    pub fn load(self) -> Result<Config, ConfigError> {
        let mut config = match self.file_path {
            Some(ref path) => Self::load_from_file(path)?,
            None => Config::default(),
        };

        if let Some(ref prefix) = self.env_prefix {
            apply_env_overrides(&mut config, prefix, |key| std::env::var(key).ok())?;
        }

        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &str) -> Result<Config, ConfigError> {
        debug!(path, "loading configuration");

        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound(path.to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let format = ConfigFormat::from_extension(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_string()))?;
        let config: Config = format.parse(&content)?;

        info!(path, ?format, "loaded configuration");
        Ok(config)
    }
}

/// Apply `{prefix}_BACKEND`, `{prefix}_PORTABLE_LANES`, `{prefix}_LOG_LEVEL`
/// and `{prefix}_LOG_FORMAT`, reading variables through `lookup`.
fn apply_env_overrides(
    config: &mut Config,
    prefix: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let var = |name: &str| lookup(&format!("{}_{}", prefix, name));

    if let Some(val) = var("BACKEND") {
        config.kernel.backend = val;
    }
    if let Some(val) = var("PORTABLE_LANES") {
        config.kernel.portable_lanes = val.trim().parse().map_err(|_| {
            ConfigError::invalid_value(
                format!("{}_PORTABLE_LANES", prefix),
                format!("'{}' is not a lane count", val),
            )
        })?;
    }
    if let Some(val) = var("LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Some(val) = var("LOG_FORMAT") {
        config.logging.format = val;
    }

    Ok(())
}

/// Load the first of [`DEFAULT_CONFIG_FILES`] found in the working
/// directory, falling back to defaults. `VSOFTMAX_*` overrides always apply.
pub fn load_default_config() -> Result<Config, ConfigError> {
    load_config_from_dir(Path::new("."))
}

/// [`load_default_config`] rooted at `dir`.
pub fn load_config_from_dir(dir: &Path) -> Result<Config, ConfigError> {
    let found: Option<PathBuf> = DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists());

    match found {
        Some(path) => ConfigLoader::new()
            .with_file(path.to_string_lossy())
            .with_env_prefix(ENV_PREFIX)
            .load(),
        None => {
            debug!("no configuration file found, using defaults");
            Config::from_env()
        }
    }
}

/// Builder for programmatic configuration.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set kernel configuration.
    pub fn kernel(mut self, config: KernelConfig) -> Self {
        self.config.kernel = config;
        self
    }

    /// Set logging configuration.
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.config.logging = config;
        self
    }

    /// Set the backend name.
    pub fn backend(mut self, name: impl Into<String>) -> Self {
        self.config.kernel.backend = name.into();
        self
    }

    /// Set the portable lane count.
    pub fn portable_lanes(mut self, lanes: usize) -> Self {
        self.config.kernel.portable_lanes = lanes;
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
