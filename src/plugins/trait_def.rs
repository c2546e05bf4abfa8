//! Plugin trait definitions

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::PluginContext;
use crate::application::errors::BotError;
use crate::domain::entities::{Command, CommandEntry};

/// Core plugin trait that all plugins must implement
///
/// Hooks run while the plugin manager holds its lifecycle lock, so they must
/// not call back into the manager.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Register commands and acquire resources
    async fn init(&self, registrar: &mut Registrar<'_>) -> Result<(), BotError>;

    /// Optional: release resources when the plugin is unloaded
    async fn shutdown(&self) -> Result<(), BotError> {
        Ok(())
    }
}

/// Collects the commands a plugin registers during `init`
pub struct Registrar<'a> {
    plugin: &'a str,
    ctx: &'a PluginContext,
    commands: Vec<CommandEntry>,
}

impl<'a> Registrar<'a> {
    pub fn new(plugin: &'a str, ctx: &'a PluginContext) -> Self {
        Self {
            plugin,
            ctx,
            commands: Vec::new(),
        }
    }

    pub fn context(&self) -> &PluginContext {
        self.ctx
    }

    /// Run the command's init hook and register it under `name`
    pub async fn add_command<C: Command + 'static>(&mut self, name: &str, command: C) -> Result<(), BotError> {
        let handler: Arc<dyn Command> = Arc::new(command);
        handler.init(self.ctx).await?;
        self.commands.push(CommandEntry::new(self.plugin, name, handler));
        Ok(())
    }

    pub fn into_commands(self) -> Vec<CommandEntry> {
        self.commands
    }
}

/// A loaded plugin and everything it registered
pub struct PluginEntry {
    pub name: String,
    pub instance: Box<dyn Plugin>,
    pub commands: Vec<Arc<CommandEntry>>,
    // Keeps the backing library mapped; must stay the last field.
    pub origin: Option<Arc<dyn Any + Send + Sync>>,
}

impl PluginEntry {
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.name.as_str())
    }
}

/// Outcome of a best-effort batch operation
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, BotError)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }
}
