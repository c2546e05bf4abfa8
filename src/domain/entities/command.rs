use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::{CommandContext, PluginContext};
use crate::application::errors::BotError;
use crate::domain::entities::Message;

/// Processing routine behind a prefixed command
#[async_trait]
pub trait Command: Send + Sync {
    fn usage(&self) -> &str {
        ""
    }

    fn description(&self) -> &str {
        ""
    }

    /// Optional: runs once when the owning plugin registers the command
    async fn init(&self, _ctx: &PluginContext) -> Result<(), BotError> {
        Ok(())
    }

    /// Handle one invocation. `suffix` is the trimmed text after the command name.
    async fn process(
        &self,
        ctx: &CommandContext,
        message: &Message,
        suffix: &str,
    ) -> Result<(), BotError>;
}

/// A command registered by a plugin
///
/// Entries live exactly as long as the plugin that registered them stays
/// loaded, plus any in-flight invocation still holding an `Arc` to one.
pub struct CommandEntry {
    pub name: String,
    pub usage: String,
    pub description: String,
    pub plugin: String,
    handler: Arc<dyn Command>,
    // Declared after `handler` so the handler drops before the code backing it.
    origin: Option<Arc<dyn Any + Send + Sync>>,
}

impl CommandEntry {
    pub fn new(plugin: impl Into<String>, name: impl Into<String>, handler: Arc<dyn Command>) -> Self {
        Self {
            name: name.into(),
            usage: handler.usage().to_string(),
            description: handler.description().to_string(),
            plugin: plugin.into(),
            handler,
            origin: None,
        }
    }

    /// Pin a resource (e.g. a loaded library) for the lifetime of this entry
    pub fn with_origin(mut self, origin: Arc<dyn Any + Send + Sync>) -> Self {
        self.origin = Some(origin);
        self
    }

    pub async fn run(
        &self,
        ctx: &CommandContext,
        message: &Message,
        suffix: &str,
    ) -> Result<(), BotError> {
        self.handler.process(ctx, message, suffix).await
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("plugin", &self.plugin)
            .field("pinned", &self.origin.is_some())
            .finish()
    }
}

/// Union of the commands of every active plugin, in load order
#[derive(Default, Clone)]
pub struct CommandSet {
    commands: Vec<Arc<CommandEntry>>,
}

impl CommandSet {
    pub fn new(commands: Vec<Arc<CommandEntry>>) -> Self {
        Self { commands }
    }

    /// Exact, case-sensitive lookup
    pub fn find(&self, name: &str) -> Option<&Arc<CommandEntry>> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandEntry>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
