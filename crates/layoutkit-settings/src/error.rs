//! Errors raised while reading, writing and checking editor configuration.

use thiserror::Error;

/// Failure of a settings file operation.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    #[error("Failed to save settings: {0}")]
    SaveError(String),

    /// No platform config directory, or it could not be created.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("Invalid settings: {0}")]
    Config(#[from] ConfigError),
}

/// A configuration that parsed but cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// File extension other than `.toml` or `.json`.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Value out of range for '{key}': {value}")]
    ValueOutOfRange { key: String, value: String },

    /// Two values that only make sense together disagree, e.g. `min_zoom`
    /// above `max_zoom`.
    #[error("Inconsistent settings '{first}' and '{second}': {reason}")]
    Inconsistent {
        first: String,
        second: String,
        reason: String,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

pub type ConfigResult<T> = Result<T, ConfigError>;
