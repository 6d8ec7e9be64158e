use thiserror::Error;

/// Errors that can occur when parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("environment variable '{name}' referenced in config is not set")]
    MissingEnv { name: String },

    #[error("unterminated '${{' in config value: {value}")]
    UnterminatedEnv { value: String },

    #[error("port must be non-zero")]
    InvalidPort,

    #[error("timeout_ms must be positive")]
    InvalidTimeout,

    #[error("invalid state tag: {0}")]
    InvalidState(#[from] keeperstate_core::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
