//! Console adapter for development/testing
//!
//! Every stdin line becomes a message authored by the controlled account in
//! the `console` channel, so prefixed lines run commands. Outbound actions are
//! printed and mirrored into an in-memory history.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Message, User};
use crate::domain::traits::{ActionTarget, Transport, TransportEvent};

pub const CONSOLE_CHANNEL: &str = "console";
const EVENT_BUFFER: usize = 64;

#[derive(Default)]
struct ConsoleState {
    /// Oldest first
    history: Vec<Message>,
    pinned: Vec<String>,
    presence: Option<String>,
}

/// Console transport for local development
pub struct ConsoleAdapter {
    user: User,
    state: Arc<Mutex<ConsoleState>>,
}

impl ConsoleAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            user: User::new("console-user", name),
            state: Arc::new(Mutex::new(ConsoleState::default())),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, ConsoleState>, BotError> {
        self.state
            .lock()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))
    }

    fn channel_of(target: &ActionTarget) -> String {
        match target {
            ActionTarget::Message(m) => m.channel_id.clone(),
            ActionTarget::Channel(id) => id.clone(),
            ActionTarget::None => CONSOLE_CHANNEL.to_string(),
        }
    }

    fn lookup(state: &ConsoleState, message: &Message) -> Result<usize, BotError> {
        state
            .history
            .iter()
            .position(|m| m.id == message.id)
            .ok_or_else(|| BotError::NotFound(format!("message {}", message.id)))
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new("selfbot")
    }
}

#[async_trait]
impl Transport for ConsoleAdapter {
    async fn connect(&self) -> Result<mpsc::Receiver<TransportEvent>, BotError> {
        tracing::info!("Starting console transport (dev mode)");
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let user = self.user.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            if tx.send(TransportEvent::Connected(user.clone())).await.is_err() {
                return;
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let message = Message::new(CONSOLE_CHANNEL, user.clone(), line);
                        if let Ok(mut state) = state.lock() {
                            state.history.push(message.clone());
                        }
                        if tx.send(TransportEvent::Message(message)).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(TransportEvent::Error(BotError::Transport(e.to_string()))).await;
                        break;
                    }
                }
            }
            let _ = tx.send(TransportEvent::Disconnected).await;
        });

        Ok(rx)
    }

    fn current_user(&self) -> Option<User> {
        Some(self.user.clone())
    }

    async fn resolve_channel(&self, target: &ActionTarget) -> Result<String, BotError> {
        match target {
            ActionTarget::None => Err(BotError::NotFound("no target".to_string())),
            other => Ok(Self::channel_of(other)),
        }
    }

    async fn send_message(&self, target: &ActionTarget, text: &str) -> Result<Message, BotError> {
        let message = Message::new(Self::channel_of(target), self.user.clone(), text);
        println!("[{}] {}", message.channel_id, text);
        self.state()?.history.push(message.clone());
        Ok(message)
    }

    async fn edit_message(&self, message: &Message, text: &str) -> Result<Message, BotError> {
        let mut state = self.state()?;
        let index = Self::lookup(&state, message)?;
        state.history[index].content = text.to_string();
        println!("[{}] (edited) {}", message.channel_id, text);
        Ok(state.history[index].clone())
    }

    async fn delete_message(&self, message: &Message) -> Result<(), BotError> {
        let mut state = self.state()?;
        let index = Self::lookup(&state, message)?;
        state.history.remove(index);
        state.pinned.retain(|id| id != &message.id);
        Ok(())
    }

    async fn fetch_history(&self, target: &ActionTarget, limit: usize) -> Result<Vec<Message>, BotError> {
        let channel = Self::channel_of(target);
        Ok(self
            .state()?
            .history
            .iter()
            .rev()
            .filter(|m| m.channel_id == channel)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn pin_message(&self, message: &Message) -> Result<(), BotError> {
        let mut state = self.state()?;
        Self::lookup(&state, message)?;
        if !state.pinned.contains(&message.id) {
            state.pinned.push(message.id.clone());
        }
        Ok(())
    }

    async fn unpin_message(&self, message: &Message) -> Result<(), BotError> {
        self.state()?.pinned.retain(|id| id != &message.id);
        Ok(())
    }

    async fn pinned_messages(&self, target: &ActionTarget) -> Result<Vec<Message>, BotError> {
        let channel = Self::channel_of(target);
        let state = self.state()?;
        Ok(state
            .history
            .iter()
            .filter(|m| m.channel_id == channel && state.pinned.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn set_presence(&self, game: Option<&str>) -> Result<(), BotError> {
        self.state()?.presence = game.map(str::to_string);
        match game {
            Some(game) => tracing::info!("Presence set to \"{}\"", game),
            None => tracing::info!("Presence cleared"),
        }
        Ok(())
    }

    fn presence(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.presence.clone())
    }
}
