//! Configuration error types.

use thiserror::Error;
use validator::ValidationErrors;
use vsoftmax_kernels::KernelError;

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Validation error.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error.
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid value.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Unsupported format.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// The configured vector unit cannot be built.
    #[error("Kernel configuration error: {0}")]
    Kernel(#[from] KernelError),
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let error_msgs: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("validation failed for {}", e.code))
                    })
                    .collect();
                format!("{}: {}", field, error_msgs.join(", "))
            })
            .collect();
        if messages.is_empty() {
            messages.push(errors.to_string());
        }

        ConfigError::ValidationError(messages.join("; "))
    }
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigError::invalid_value("kernel.backend", "unknown");
        assert_eq!(err.to_string(), "Invalid value for kernel.backend: unknown");
    }

    #[test]
    fn test_kernel_error_converts() {
        let err: ConfigError = KernelError::InvalidLaneCount(0).into();
        assert!(matches!(err, ConfigError::Kernel(KernelError::InvalidLaneCount(0))));
    }
}
