//! selfbot - a self-operating chat agent
//!
//! Commands typed by the controlled account are routed to plugin-provided
//! handlers; every outbound call they make is serialized per conversation by
//! the action queue, which also absorbs provider rate limits.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;

pub use application::errors::{BotError, ConfigError, PluginError, StorageError};
pub use application::events::{AgentEvent, EventBus};
pub use application::services::{Actions, Agent};
pub use infrastructure::config::{Config, ConfigSource};
