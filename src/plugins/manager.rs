//! Plugin manager - handles plugin lifecycle and the visible command set
//!
//! Lifecycle operations are serialized by one async lock. The router never
//! takes that lock: it reads a command-set snapshot that is swapped after each
//! change, so a command may still run after its plugin was unloaded by a
//! concurrent reload.

use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::application::context::PluginContext;
use crate::application::errors::{BotError, PluginError};
use crate::application::events::EventBus;
use crate::domain::entities::CommandSet;
use crate::domain::traits::Store;
use crate::infrastructure::config::{Config, ConfigSource};
use crate::infrastructure::plugins::PluginCatalog;
use crate::plugins::trait_def::{BatchReport, PluginEntry, Registrar};

/// Summary of a loaded plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
    pub commands: Vec<String>,
}

/// Owns the active plugins
pub struct PluginManager {
    catalog: PluginCatalog,
    source: ConfigSource,
    config: RwLock<Arc<Config>>,
    store: Option<Arc<dyn Store>>,
    events: EventBus,
    plugins: Mutex<Vec<PluginEntry>>,
    commands: RwLock<CommandSet>,
}

impl PluginManager {
    pub fn new(
        catalog: PluginCatalog,
        source: ConfigSource,
        config: Config,
        store: Option<Arc<dyn Store>>,
        events: EventBus,
    ) -> Self {
        Self {
            catalog,
            source,
            config: RwLock::new(Arc::new(config)),
            store,
            events,
            plugins: Mutex::new(Vec::new()),
            commands: RwLock::new(CommandSet::default()),
        }
    }

    /// The active configuration
    pub fn config(&self) -> Arc<Config> {
        match self.config.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn store(&self) -> Option<Arc<dyn Store>> {
        self.store.clone()
    }

    /// Snapshot of every routable command
    pub fn commands(&self) -> CommandSet {
        match self.commands.read() {
            Ok(commands) => commands.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of the loaded plugins, in load order
    pub async fn loaded(&self) -> Vec<String> {
        self.plugins.lock().await.iter().map(|p| p.name.clone()).collect()
    }

    pub async fn list(&self) -> Vec<PluginInfo> {
        self.plugins
            .lock()
            .await
            .iter()
            .map(|p| PluginInfo {
                name: p.name.clone(),
                description: p.instance.description().to_string(),
                commands: p.command_names().map(str::to_string).collect(),
            })
            .collect()
    }

    pub async fn is_loaded(&self, name: &str) -> bool {
        self.plugins.lock().await.iter().any(|p| p.name == name)
    }

    /// Load a single plugin
    pub async fn load(&self, name: &str) -> Result<(), BotError> {
        let mut plugins = self.plugins.lock().await;
        self.load_locked(&mut plugins, name).await
    }

    /// Load every configured plugin, continuing past failures
    pub async fn load_all(&self) -> BatchReport {
        let mut plugins = self.plugins.lock().await;
        self.load_all_locked(&mut plugins).await
    }

    /// Unload a single plugin
    pub async fn unload(&self, name: &str) -> Result<(), BotError> {
        let mut plugins = self.plugins.lock().await;
        self.unload_locked(&mut plugins, name).await
    }

    /// Unload every loaded plugin, continuing past failures
    pub async fn unload_all(&self) -> BatchReport {
        let mut plugins = self.plugins.lock().await;
        self.unload_all_locked(&mut plugins).await
    }

    /// Unload everything, re-read the configuration, load everything.
    ///
    /// Not atomic: plugins that fail to come back stay unloaded. A
    /// configuration that fails to load leaves the previous one active.
    pub async fn reload(&self) -> BatchReport {
        let mut plugins = self.plugins.lock().await;
        let mut report = self.unload_all_locked(&mut plugins).await;
        report.succeeded.clear();

        match self.source.load() {
            Ok(config) => {
                if let Ok(mut current) = self.config.write() {
                    *current = Arc::new(config);
                }
                info!("Configuration reloaded");
            }
            Err(e) => {
                warn!("Keeping previous configuration: {}", e);
                let e = BotError::from(e);
                self.events.report(e.clone());
                report.failed.push(("config".to_string(), e));
            }
        }

        report.merge(self.load_all_locked(&mut plugins).await);
        report
    }

    async fn load_locked(&self, plugins: &mut Vec<PluginEntry>, name: &str) -> Result<(), BotError> {
        if plugins.iter().any(|p| p.name == name) {
            return Err(PluginError::AlreadyLoaded(name.to_string()).into());
        }

        let config = self.config();
        let made = self
            .catalog
            .instantiate(name, config.plugins.directory.as_deref())?;

        let ctx = PluginContext::new(config, self.store.clone());
        let mut registrar = Registrar::new(name, &ctx);
        made.plugin.init(&mut registrar).await?;

        let commands = registrar.into_commands();
        if let Some(err) = find_collision(plugins, name, &commands) {
            if let Err(e) = made.plugin.shutdown().await {
                warn!("Teardown of rejected plugin \"{}\" failed: {}", name, e);
            }
            return Err(err.into());
        }

        let commands = commands
            .into_iter()
            .map(|c| match &made.origin {
                Some(origin) => Arc::new(c.with_origin(origin.clone())),
                None => Arc::new(c),
            })
            .collect();

        plugins.push(PluginEntry {
            name: name.to_string(),
            instance: made.plugin,
            commands,
            origin: made.origin,
        });
        self.publish(plugins);

        info!("Loaded plugin \"{}\"", name);
        Ok(())
    }

    async fn load_all_locked(&self, plugins: &mut Vec<PluginEntry>) -> BatchReport {
        let mut report = BatchReport::default();
        let names = self.config().plugins.enabled.clone();

        for name in names {
            match self.load_locked(plugins, &name).await {
                Ok(()) => report.succeeded.push(name),
                Err(e) => {
                    warn!("Failed to load plugin \"{}\": {}", name, e);
                    self.events.report(e.clone());
                    report.failed.push((name, e));
                }
            }
        }
        report
    }

    async fn unload_locked(&self, plugins: &mut Vec<PluginEntry>, name: &str) -> Result<(), BotError> {
        let index = plugins
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PluginError::NotLoaded(name.to_string()))?;

        // The entry goes even if teardown fails, so the name can be loaded again.
        let entry = plugins.remove(index);
        self.publish(plugins);
        let teardown = entry.instance.shutdown().await;
        drop(entry);

        match teardown {
            Ok(()) => {
                info!("Unloaded plugin \"{}\"", name);
                Ok(())
            }
            Err(e) => {
                warn!("Plugin \"{}\" unloaded with teardown error: {}", name, e);
                Err(e)
            }
        }
    }

    async fn unload_all_locked(&self, plugins: &mut Vec<PluginEntry>) -> BatchReport {
        let mut report = BatchReport::default();
        let names: Vec<String> = plugins.iter().map(|p| p.name.clone()).collect();

        for name in names {
            match self.unload_locked(plugins, &name).await {
                Ok(()) => report.succeeded.push(name),
                Err(e) => {
                    warn!("Failed to unload plugin \"{}\": {}", name, e);
                    self.events.report(e.clone());
                    report.failed.push((name, e));
                }
            }
        }
        report
    }

    /// Rebuild the router-visible command set from the active plugins
    fn publish(&self, plugins: &[PluginEntry]) {
        let set = CommandSet::new(
            plugins
                .iter()
                .flat_map(|p| p.commands.iter().cloned())
                .collect(),
        );
        match self.commands.write() {
            Ok(mut commands) => *commands = set,
            Err(poisoned) => *poisoned.into_inner() = set,
        }
    }
}

fn find_collision(
    plugins: &[PluginEntry],
    plugin: &str,
    commands: &[crate::domain::entities::CommandEntry],
) -> Option<PluginError> {
    for (i, command) in commands.iter().enumerate() {
        let owner = plugins
            .iter()
            .find(|p| p.command_names().any(|n| n == command.name))
            .map(|p| p.name.clone())
            .or_else(|| {
                commands[..i]
                    .iter()
                    .any(|c| c.name == command.name)
                    .then(|| plugin.to_string())
            });

        if let Some(owner) = owner {
            return Some(PluginError::DuplicateCommand {
                command: command.name.clone(),
                plugin: plugin.to_string(),
                owner,
            });
        }
    }
    None
}
