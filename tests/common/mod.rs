//! Shared fixtures: a scripted in-memory transport and an agent harness
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;

use selfbot::application::queue::{ActionQueue, TransportResolver};
use selfbot::domain::entities::{Message, User};
use selfbot::domain::traits::{ActionTarget, Transport, TransportEvent};
use selfbot::{Actions, BotError, EventBus};

static INIT: Once = Once::new();

/// Opt-in test logging via RUST_LOG
pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const SELF_ID: &str = "self";

/// A completed send
#[derive(Debug, Clone)]
pub struct Sent {
    pub channel: String,
    pub text: String,
    pub at: Instant,
}

#[derive(Default)]
struct Script {
    sent: Vec<Sent>,
    /// Every send attempt, in the order it started
    attempts: Vec<String>,
    rate_limits: HashMap<String, VecDeque<Duration>>,
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    in_flight: HashMap<String, usize>,
    max_in_flight: HashMap<String, usize>,
    history: Vec<Message>,
    deleted: Vec<String>,
    presence: Option<String>,
}

/// Transport whose send behavior is scripted per message text
pub struct ScriptedTransport {
    me: User,
    tx: mpsc::Sender<TransportEvent>,
    rx: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::channel(64);
        Arc::new(Self {
            me: User::new(SELF_ID, "me"),
            tx,
            rx: Mutex::new(Some(rx)),
            script: Mutex::new(Script::default()),
        })
    }

    pub fn me(&self) -> User {
        self.me.clone()
    }

    /// Fail the next sends of `text` with a rate limit, one delay per failure
    pub fn rate_limit(&self, text: &str, delays: &[Duration]) {
        self.script
            .lock()
            .unwrap()
            .rate_limits
            .insert(text.to_string(), delays.iter().copied().collect());
    }

    pub fn fail(&self, text: &str) {
        self.script.lock().unwrap().failures.insert(text.to_string());
    }

    pub fn delay(&self, text: &str, delay: Duration) {
        self.script.lock().unwrap().delays.insert(text.to_string(), delay);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.script.lock().unwrap().sent.clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }

    pub fn attempts(&self) -> Vec<String> {
        self.script.lock().unwrap().attempts.clone()
    }

    pub fn max_in_flight(&self, channel: &str) -> usize {
        self.script
            .lock()
            .unwrap()
            .max_in_flight
            .get(channel)
            .copied()
            .unwrap_or(0)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.script.lock().unwrap().deleted.clone()
    }

    /// Record an existing message in the channel history
    pub fn seed(&self, message: Message) {
        self.script.lock().unwrap().history.push(message);
    }

    pub async fn push(&self, event: TransportEvent) {
        self.tx.send(event).await.unwrap();
    }

    /// A message authored by the controlled account
    pub fn own(&self, channel: &str, text: &str) -> Message {
        Message::new(channel, self.me(), text)
    }

    fn channel_of(target: &ActionTarget) -> Option<String> {
        match target {
            ActionTarget::Message(m) => Some(m.channel_id.clone()),
            ActionTarget::Channel(id) => Some(id.clone()),
            ActionTarget::None => None,
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self) -> Result<mpsc::Receiver<TransportEvent>, BotError> {
        self.rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BotError::Transport("already connected".to_string()))
    }

    fn current_user(&self) -> Option<User> {
        Some(self.me.clone())
    }

    async fn resolve_channel(&self, target: &ActionTarget) -> Result<String, BotError> {
        Self::channel_of(target).ok_or_else(|| BotError::NotFound("channel".to_string()))
    }

    async fn send_message(&self, target: &ActionTarget, text: &str) -> Result<Message, BotError> {
        let channel = Self::channel_of(target).unwrap_or_default();
        let delay = {
            let mut script = self.script.lock().unwrap();
            script.attempts.push(text.to_string());
            let running = script.in_flight.entry(channel.clone()).or_default();
            *running += 1;
            let running = *running;
            let max = script.max_in_flight.entry(channel.clone()).or_default();
            *max = (*max).max(running);
            script.delays.get(text).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script.lock().unwrap();
        if let Some(running) = script.in_flight.get_mut(&channel) {
            *running -= 1;
        }
        if let Some(retry_after) = script.rate_limits.get_mut(text).and_then(VecDeque::pop_front) {
            return Err(BotError::RateLimited { retry_after });
        }
        if script.failures.contains(text) {
            return Err(BotError::Transport(format!("cannot send {}", text)));
        }

        let message = Message::new(channel.clone(), self.me.clone(), text);
        script.sent.push(Sent {
            channel,
            text: text.to_string(),
            at: Instant::now(),
        });
        script.history.push(message.clone());
        Ok(message)
    }

    async fn edit_message(&self, message: &Message, text: &str) -> Result<Message, BotError> {
        let mut script = self.script.lock().unwrap();
        let edited = script
            .history
            .iter_mut()
            .find(|m| m.id == message.id)
            .ok_or_else(|| BotError::NotFound("message".to_string()))?;
        edited.content = text.to_string();
        Ok(edited.clone())
    }

    async fn delete_message(&self, message: &Message) -> Result<(), BotError> {
        let mut script = self.script.lock().unwrap();
        script.history.retain(|m| m.id != message.id);
        script.deleted.push(message.id.clone());
        Ok(())
    }

    async fn fetch_history(&self, target: &ActionTarget, limit: usize) -> Result<Vec<Message>, BotError> {
        let channel = Self::channel_of(target).unwrap_or_default();
        Ok(self
            .script
            .lock()
            .unwrap()
            .history
            .iter()
            .rev()
            .filter(|m| m.channel_id == channel)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn pin_message(&self, _message: &Message) -> Result<(), BotError> {
        Ok(())
    }

    async fn unpin_message(&self, _message: &Message) -> Result<(), BotError> {
        Ok(())
    }

    async fn pinned_messages(&self, _target: &ActionTarget) -> Result<Vec<Message>, BotError> {
        Ok(Vec::new())
    }

    async fn set_presence(&self, game: Option<&str>) -> Result<(), BotError> {
        self.script.lock().unwrap().presence = game.map(str::to_string);
        Ok(())
    }

    fn presence(&self) -> Option<String> {
        self.script.lock().unwrap().presence.clone()
    }
}

/// Actions over a scripted transport, plus the bus their failures go to
pub fn actions(transport: &Arc<ScriptedTransport>) -> (Actions, EventBus) {
    let events = EventBus::new();
    let queue = Arc::new(ActionQueue::new(
        Arc::new(TransportResolver(transport.clone())),
        events.clone(),
    ));
    (Actions::new(transport.clone(), queue), events)
}

pub fn channel(id: &str) -> ActionTarget {
    ActionTarget::Channel(id.to_string())
}
