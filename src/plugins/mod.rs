//! Plugin system
//!
//! Plugins are units of command logic that can be loaded, unloaded and
//! reloaded while the agent runs.

pub mod manager;
pub mod trait_def;
pub mod util;
pub mod admin;
pub mod chat;
pub mod status;

pub use manager::{PluginInfo, PluginManager};
pub use trait_def::{BatchReport, Plugin, PluginEntry, Registrar};

use crate::infrastructure::plugins::PluginCatalog;

/// Catalog holding every built-in plugin
pub fn builtin_catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with("admin", || Box::new(admin::Admin))
        .with("chat", || Box::new(chat::Chat))
        .with("status", || Box::new(status::Status))
}
