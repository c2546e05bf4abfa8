//! Agent events - lifecycle notifications and the process-wide error channel

use tokio::sync::broadcast;

use crate::application::errors::BotError;
use crate::domain::entities::User;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Transport session established
    Connected { user: User },
    /// Plugins loaded, commands routable
    Ready,
    /// A failure nobody awaited directly (failed actions, command errors, batch items)
    Error(BotError),
    /// Session over
    End,
}

/// Broadcast bus shared by the agent's components
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AgentEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.tx.send(event);
    }

    /// Publish an error on the error channel
    pub fn report(&self, error: BotError) {
        tracing::debug!("Reporting error: {}", error);
        self.emit(AgentEvent::Error(error));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
