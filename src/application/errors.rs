//! Application layer errors

use std::time::Duration;
use thiserror::Error;

/// General bot errors
///
/// Errors are `Clone` so a single failure can be handed back to the caller of
/// an action and published on the agent's error channel.
#[derive(Error, Debug, Clone)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Duplicate loads, unloads of absent plugins and a missing store
    /// connection are all configuration problems from the caller's view.
    pub fn is_configuration(&self) -> bool {
        match self {
            BotError::Config(_) => true,
            BotError::Storage(StorageError::Unavailable) => true,
            BotError::Plugin(e) => e.is_configuration(),
            _ => false,
        }
    }

    /// Delay requested by the provider, if this is a rate-limit failure
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BotError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Plugin lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("Plugin \"{0}\" is already loaded")]
    AlreadyLoaded(String),

    #[error("No plugin with name \"{0}\"")]
    NotLoaded(String),

    #[error("Unknown plugin \"{0}\"")]
    Unknown(String),

    #[error("Failed to load plugin: {0}")]
    Load(String),

    #[error("Command \"{command}\" of plugin \"{plugin}\" is already registered by \"{owner}\"")]
    DuplicateCommand {
        command: String,
        plugin: String,
        owner: String,
    },
}

impl PluginError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, PluginError::AlreadyLoaded(_) | PluginError::NotLoaded(_))
    }
}

/// Storage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("No database connection")]
    Unavailable,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for BotError {
    fn from(e: ConfigError) -> Self {
        BotError::Config(e.to_string())
    }
}
