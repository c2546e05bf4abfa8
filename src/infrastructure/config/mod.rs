//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use crate::application::errors::ConfigError;

/// Environment variable selecting production mode (`production`, any case)
pub const ENV_MODE: &str = "SELFBOT_ENV";
pub const ENV_PREFIX: &str = "SELFBOT_PREFIX";
/// Comma separated plugin names
pub const ENV_PLUGINS: &str = "SELFBOT_PLUGINS";
pub const ENV_STORE: &str = "SELFBOT_STORE";

/// Agent configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
    pub storage: StorageConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "selfbot".to_string(),
            prefix: "!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    /// Plugins loaded by `load()` / `reload()`, in order
    pub enabled: Vec<String>,
    /// Directory searched for dynamically loaded plugins
    pub directory: Option<PathBuf>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["admin".to_string(), "chat".to_string(), "status".to_string()],
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    /// SQLite database file; no store is opened when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RuntimeConfig {
    /// Resolved once at startup from the environment, never from the file
    #[serde(skip)]
    pub production: bool,
    pub shutdown_grace_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            production: false,
            shutdown_grace_secs: 5,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Read(e.to_string()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue("bot.prefix must not be empty".to_string()));
        }
        if let Some(name) = self.plugins.enabled.iter().find(|n| n.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(format!("invalid plugin name {:?}", name)));
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(prefix) = std::env::var(ENV_PREFIX) {
            self.bot.prefix = prefix;
        }

        if let Ok(plugins) = std::env::var(ENV_PLUGINS) {
            self.plugins.enabled = plugins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(store) = std::env::var(ENV_STORE) {
            self.storage.path = Some(PathBuf::from(store));
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Whether the environment selects production mode
pub fn production_from_env() -> bool {
    std::env::var(ENV_MODE)
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
}

#[derive(Clone)]
enum Origin {
    /// YAML file plus environment overrides; defaults when the file is absent
    File(PathBuf),
    /// Held in memory; used by embedders and tests
    Memory(Arc<RwLock<Config>>),
}

/// Where the active configuration comes from, so it can be re-read on reload
#[derive(Clone)]
pub struct ConfigSource {
    origin: Origin,
    production: bool,
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
            production: false,
        }
    }

    pub fn memory(config: Config) -> Self {
        Self {
            production: config.runtime.production,
            origin: Origin::Memory(Arc::new(RwLock::new(config))),
        }
    }

    /// Pin the production flag every loaded config will carry
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Replace the in-memory configuration; no-op for file sources
    pub fn set(&self, config: Config) {
        if let Origin::Memory(cell) = &self.origin {
            if let Ok(mut current) = cell.write() {
                *current = config;
            }
        }
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        let config = match &self.origin {
            Origin::File(path) if path.exists() => {
                let mut config = Config::load(path)?;
                config.apply_env();
                config
            }
            Origin::File(path) => {
                tracing::info!("Config file {} not found, using defaults", path.display());
                let mut config = Config::default();
                config.apply_env();
                config
            }
            Origin::Memory(cell) => cell
                .read()
                .map_err(|_| ConfigError::Read("Lock poisoned".to_string()))?
                .clone(),
        };

        self.settle(config)
    }

    /// Like [`load`](Self::load), but an unreadable or invalid source falls
    /// back to defaults plus environment overrides. The fallback is validated
    /// too.
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        self.load().or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            let mut config = Config::default();
            config.apply_env();
            self.settle(config)
        })
    }

    fn settle(&self, mut config: Config) -> Result<Config, ConfigError> {
        config.runtime.production = self.production;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = Config::parse("bot:\n  prefix: \"//\"\n").unwrap();
        assert_eq!(config.bot.prefix, "//");
        assert_eq!(config.bot.name, "selfbot");
        assert_eq!(config.plugins.enabled, vec!["admin", "chat", "status"]);
        assert_eq!(config.runtime.shutdown_grace_secs, 5);
    }

    #[test]
    fn kebab_case_keys() {
        let yaml = "plugins:\n  enabled: [chat]\n  directory: /opt/plugins\nruntime:\n  shutdown-grace-secs: 9\n";
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.plugins.enabled, vec!["chat"]);
        assert_eq!(config.plugins.directory, Some(PathBuf::from("/opt/plugins")));
        assert_eq!(config.runtime.shutdown_grace_secs, 9);
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let mut config = Config::default();
        config.bot.prefix = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn memory_source_reflects_updates_and_production_flag() {
        let source = ConfigSource::memory(Config::default()).with_production(true);
        let mut changed = Config::default();
        changed.plugins.enabled = vec!["status".to_string()];
        source.set(changed);

        let loaded = source.load().unwrap();
        assert_eq!(loaded.plugins.enabled, vec!["status"]);
        assert!(loaded.runtime.production);
    }

    #[test]
    fn defaults_round_trip_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        let parsed = Config::parse(&yaml).unwrap();
        assert_eq!(parsed.bot.prefix, "!");
    }
}
