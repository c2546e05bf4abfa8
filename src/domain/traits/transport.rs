use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Message, User};

/// What an outbound action is aimed at
///
/// The action queue resolves this to a channel id to pick the lane an
/// action waits in; the transport receives the target itself.
#[derive(Debug, Clone)]
pub enum ActionTarget {
    Message(Message),
    Channel(String),
    None,
}

impl From<&Message> for ActionTarget {
    fn from(message: &Message) -> Self {
        ActionTarget::Message(message.clone())
    }
}

/// Session events emitted by a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Session established as the given account
    Connected(User),
    Message(Message),
    Error(BotError),
    Disconnected,
}

/// Transport trait - the chat network session the agent drives
///
/// Every action primitive may fail with `BotError::RateLimited`, which the
/// action queue retries transparently, or with any other error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the session and return its event stream
    async fn connect(&self) -> Result<mpsc::Receiver<TransportEvent>, BotError>;

    /// Close the session
    async fn disconnect(&self) -> Result<(), BotError> {
        Ok(())
    }

    /// The controlled account, once connected
    fn current_user(&self) -> Option<User>;

    /// Resolve a target to its channel id
    async fn resolve_channel(&self, target: &ActionTarget) -> Result<String, BotError>;

    async fn send_message(&self, target: &ActionTarget, text: &str) -> Result<Message, BotError>;

    async fn edit_message(&self, message: &Message, text: &str) -> Result<Message, BotError>;

    async fn delete_message(&self, message: &Message) -> Result<(), BotError>;

    async fn delete_messages(&self, messages: &[Message]) -> Result<(), BotError> {
        for message in messages {
            self.delete_message(message).await?;
        }
        Ok(())
    }

    /// Most recent messages of the target's channel, newest first
    async fn fetch_history(&self, target: &ActionTarget, limit: usize) -> Result<Vec<Message>, BotError>;

    async fn pin_message(&self, message: &Message) -> Result<(), BotError>;

    async fn unpin_message(&self, message: &Message) -> Result<(), BotError>;

    async fn pinned_messages(&self, target: &ActionTarget) -> Result<Vec<Message>, BotError>;

    /// Set or clear the "playing" presence
    async fn set_presence(&self, game: Option<&str>) -> Result<(), BotError>;

    fn presence(&self) -> Option<String>;
}
