use super::User;
use chrono::{DateTime, Utc};

/// A chat message as observed by the agent
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    /// Server (guild) the channel belongs to; `None` for direct messages
    pub server_id: Option<String>,
    pub author: User,
    pub content: String,
    pub mentions: Vec<User>,
    pub timestamp: DateTime<Utc>,
    pub raw: Option<serde_json::Value>,
}

impl Message {
    pub fn new(channel_id: impl Into<String>, author: User, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            server_id: None,
            author,
            content: content.into(),
            mentions: Vec::new(),
            timestamp: Utc::now(),
            raw: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_server(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<User>) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Key used for per-server persisted state; a direct message is keyed by
    /// its channel as `dm:<channel>`
    pub fn server_key(&self) -> String {
        match &self.server_id {
            Some(server) => server.clone(),
            None => format!("dm:{}", self.channel_id),
        }
    }

    pub fn is_authored_by(&self, user: &User) -> bool {
        &self.author == user
    }
}
