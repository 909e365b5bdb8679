//! Configuration management for the revpulse backend
//!
//! Settings are layered from:
//! - `config/default.{toml,yaml,json}`
//! - `config/{env}` where `env` comes from the caller or `REVPULSE_ENV`
//! - Environment variables (`REVPULSE__` prefix, `__` between sections)

pub mod settings;

pub use settings::{
    load_settings, load_settings_from, AuthConfig, DashboardConfig, LlmConfig, LogFormat,
    ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings, StoreBackend, StoreConfig,
    ENV_PREFIX, ENV_SELECTOR,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(path) => ConfigError::FileNotFound(path),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
