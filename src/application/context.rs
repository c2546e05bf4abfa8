//! Contexts handed to plugins and commands

use std::sync::Arc;

use crate::application::errors::{BotError, StorageError};
use crate::application::events::EventBus;
use crate::application::services::Actions;
use crate::domain::traits::Store;
use crate::infrastructure::config::Config;
use crate::plugins::PluginManager;

/// Available to plugin and command init hooks
#[derive(Clone)]
pub struct PluginContext {
    pub config: Arc<Config>,
    store: Option<Arc<dyn Store>>,
}

impl PluginContext {
    pub fn new(config: Arc<Config>, store: Option<Arc<dyn Store>>) -> Self {
        Self { config, store }
    }

    /// The store, or `StorageError::Unavailable` when no connection exists
    pub fn store(&self) -> Result<&Arc<dyn Store>, StorageError> {
        self.store.as_ref().ok_or(StorageError::Unavailable)
    }
}

/// Available to a command while it processes one message
#[derive(Clone)]
pub struct CommandContext {
    pub actions: Actions,
    pub config: Arc<Config>,
    pub plugins: Arc<PluginManager>,
    pub events: EventBus,
    store: Option<Arc<dyn Store>>,
}

impl CommandContext {
    pub fn new(
        actions: Actions,
        config: Arc<Config>,
        plugins: Arc<PluginManager>,
        events: EventBus,
        store: Option<Arc<dyn Store>>,
    ) -> Self {
        Self {
            actions,
            config,
            plugins,
            events,
            store,
        }
    }

    pub fn store(&self) -> Result<&Arc<dyn Store>, BotError> {
        self.store.as_ref().ok_or(BotError::Storage(StorageError::Unavailable))
    }

    pub fn prefix(&self) -> &str {
        &self.config.bot.prefix
    }
}
