//! Configuration validation.

use vsoftmax_kernels::MAX_PORTABLE_LANES;

use crate::error::ConfigError;
use crate::Config;

/// Accepted log levels.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepted log formats.
pub const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

/// Validate a configuration.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_kernel_config(config)?;
    validate_logging_config(config)?;
    Ok(())
}

fn validate_kernel_config(config: &Config) -> Result<(), ConfigError> {
    // "auto" or any backend name the kernels understand
    if config.kernel.backend_choice().is_err() {
        return Err(ConfigError::invalid_value(
            "kernel.backend",
            format!(
                "unknown backend '{}', must be one of: auto, portable, avx2, neon",
                config.kernel.backend
            ),
        ));
    }

    if config.kernel.portable_lanes == 0 || config.kernel.portable_lanes > MAX_PORTABLE_LANES {
        return Err(ConfigError::invalid_value(
            "kernel.portable_lanes",
            format!("must be between 1 and {}", MAX_PORTABLE_LANES),
        ));
    }

    Ok(())
}

fn validate_logging_config(config: &Config) -> Result<(), ConfigError> {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::invalid_value(
            "logging.level",
            format!("must be one of: {}", LOG_LEVELS.join(", ")),
        ));
    }

    let format = config.logging.format.to_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(ConfigError::invalid_value(
            "logging.format",
            format!("must be one of: {}", LOG_FORMATS.join(", ")),
        ));
    }

    Ok(())
}
