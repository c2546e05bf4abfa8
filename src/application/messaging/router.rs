//! Command router - self-authored, prefixed messages to command handlers
//!
//! The router keeps no state between messages. It looks commands up in the
//! plugin manager's current snapshot and reads the prefix from the active
//! configuration, so both follow a reload.

use std::sync::Arc;

use tracing::{debug, error};

use crate::application::context::CommandContext;
use crate::application::errors::BotError;
use crate::application::events::EventBus;
use crate::application::messaging::parser::{CommandParser, ParsedCommand};
use crate::application::services::Actions;
use crate::domain::entities::{CommandEntry, Message};
use crate::plugins::PluginManager;

pub struct Router {
    actions: Actions,
    plugins: Arc<PluginManager>,
    events: EventBus,
}

impl Router {
    pub fn new(actions: Actions, plugins: Arc<PluginManager>, events: EventBus) -> Self {
        Self {
            actions,
            plugins,
            events,
        }
    }

    /// The command a message invokes, if any
    pub fn route(&self, message: &Message) -> Option<(Arc<CommandEntry>, ParsedCommand)> {
        let me = self.actions.current_user()?;
        if !message.is_authored_by(&me) {
            return None;
        }

        let config = self.plugins.config();
        let parsed = CommandParser::new(config.bot.prefix.as_str()).parse(&message.content)?;
        let entry = self.plugins.commands().find(&parsed.name)?.clone();
        Some((entry, parsed))
    }

    /// Run the command a message invokes; `false` if it invoked none.
    ///
    /// Command errors go to the error channel instead of the caller.
    pub async fn handle(&self, message: Message) -> bool {
        let Some((entry, parsed)) = self.route(&message) else {
            return false;
        };

        debug!("Running {}{} from plugin \"{}\"", self.plugins.config().bot.prefix, entry.name, entry.plugin);
        let ctx = CommandContext::new(
            self.actions.clone(),
            self.plugins.config(),
            self.plugins.clone(),
            self.events.clone(),
            self.plugins.store(),
        );

        if let Err(e) = entry.run(&ctx, &message, &parsed.suffix).await {
            error!("Command \"{}\" failed: {}", entry.name, e);
            self.events.report(e);
        }
        true
    }

    /// Handle a message on its own task so a slow or failing command never
    /// holds up the next one.
    pub fn dispatch(self: &Arc<Self>, message: Message) {
        let router = self.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let task = tokio::spawn(async move { router.handle(message).await });
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Command panicked: {}", e);
                    events.report(BotError::Internal(format!("command panicked: {}", e)));
                }
            }
        });
    }
}
