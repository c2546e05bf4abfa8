//! Plugin load/unload/reload semantics
//! Run with: cargo test --test plugin_lifecycle_test

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use selfbot::application::context::CommandContext;
use selfbot::domain::entities::{Command, Message};
use selfbot::domain::traits::Store;
use selfbot::infrastructure::plugins::PluginCatalog;
use selfbot::infrastructure::storage::MemoryStore;
use selfbot::plugins::{builtin_catalog, Plugin, PluginManager, Registrar};
use selfbot::{AgentEvent, BotError, Config, ConfigSource, EventBus, PluginError, StorageError};

fn config(enabled: &[&str]) -> Config {
    let mut config = Config::default();
    config.plugins.enabled = enabled.iter().map(|s| s.to_string()).collect();
    config
}

fn manager_with(catalog: PluginCatalog, source: ConfigSource, store: bool) -> PluginManager {
    let store: Option<Arc<dyn Store>> = if store {
        Some(Arc::new(MemoryStore::new()) as Arc<dyn Store>)
    } else {
        None
    };
    let initial = source.load().unwrap();
    PluginManager::new(catalog, source, initial, store, EventBus::new())
}

fn builtin_manager(enabled: &[&str]) -> PluginManager {
    manager_with(builtin_catalog(), ConfigSource::memory(config(enabled)), true)
}

#[tokio::test]
async fn loading_twice_fails_and_keeps_one_entry() {
    common::ensure_init();
    let manager = builtin_manager(&[]);
    manager.load("chat").await.unwrap();

    let err = manager.load("chat").await.unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, BotError::Plugin(PluginError::AlreadyLoaded(ref n)) if n == "chat"));
    assert_eq!(manager.loaded().await, ["chat"]);
    assert_eq!(manager.commands().names(), ["tag", "code", "purge"]);
}

#[tokio::test]
async fn unloading_an_absent_plugin_fails() {
    let manager = builtin_manager(&[]);
    let err = manager.unload("chat").await.unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, BotError::Plugin(PluginError::NotLoaded(_))));
}

#[tokio::test]
async fn unload_all_then_load_all_restores_the_command_set() {
    let manager = builtin_manager(&["admin", "chat", "status"]);
    assert!(manager.load_all().await.is_clean());
    let before = manager.commands().names();

    let unloaded = manager.unload_all().await;
    assert_eq!(unloaded.succeeded, ["admin", "chat", "status"]);
    assert!(manager.commands().is_empty());

    assert!(manager.load_all().await.is_clean());
    assert_eq!(manager.commands().names(), before);
}

#[tokio::test]
async fn reload_with_unchanged_config_is_identity() {
    let manager = builtin_manager(&["admin", "chat", "status"]);
    manager.load_all().await;
    let before = manager.commands().names();

    let report = manager.reload().await;
    assert!(report.is_clean());
    assert_eq!(manager.commands().names(), before);
}

#[tokio::test]
async fn reload_picks_up_configuration_changes() {
    let source = ConfigSource::memory(config(&["admin", "chat"]));
    let manager = manager_with(builtin_catalog(), source.clone(), true);
    manager.load_all().await;

    let mut next = config(&["status"]);
    next.bot.prefix = "//".to_string();
    source.set(next);

    assert!(manager.reload().await.is_clean());
    assert_eq!(manager.loaded().await, ["status"]);
    assert_eq!(manager.commands().names(), ["game"]);
    assert_eq!(manager.config().bot.prefix, "//");
}

#[tokio::test]
async fn failed_config_read_keeps_previous_configuration() {
    let path = std::env::temp_dir().join(format!("selfbot-{}.yaml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "plugins:\n  enabled: [status]\n").unwrap();
    let manager = manager_with(builtin_catalog(), ConfigSource::file(&path), false);
    manager.load_all().await;

    std::fs::write(&path, "plugins: [unterminated\n").unwrap();
    let report = manager.reload().await;
    let _ = std::fs::remove_file(&path);

    assert!(report.failed.iter().any(|(name, e)| name == "config" && e.is_configuration()));
    assert_eq!(manager.loaded().await, ["status"]);
}

#[tokio::test]
async fn batch_load_continues_past_failures() {
    let manager = builtin_manager(&["admin", "missing", "status"]);

    let report = manager.load_all().await;
    assert_eq!(report.succeeded, ["admin", "status"]);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0],
        (ref name, BotError::Plugin(PluginError::Unknown(_))) if name == "missing"
    ));
}

#[tokio::test]
async fn batch_failures_reach_the_error_channel() {
    let events = EventBus::new();
    let mut rx = events.subscribe();
    let manager = PluginManager::new(
        builtin_catalog(),
        ConfigSource::memory(config(&["missing"])),
        config(&["missing"]),
        None,
        events,
    );

    manager.load_all().await;
    assert!(matches!(
        rx.recv().await.unwrap(),
        AgentEvent::Error(BotError::Plugin(PluginError::Unknown(_)))
    ));
}

#[tokio::test]
async fn store_backed_plugin_needs_a_store() {
    let manager = manager_with(builtin_catalog(), ConfigSource::memory(config(&[])), false);
    let err = manager.load("chat").await.unwrap_err();
    assert!(matches!(err, BotError::Storage(StorageError::Unavailable)));
    assert!(err.is_configuration());
    assert!(manager.loaded().await.is_empty());
}

struct Noop;

#[async_trait]
impl Command for Noop {
    async fn process(&self, _: &CommandContext, _: &Message, _: &str) -> Result<(), BotError> {
        Ok(())
    }
}

/// Registers `cmd`; its hooks fail on demand and record teardown
struct Flaky {
    fail_init: bool,
    fail_shutdown: bool,
    torn_down: Arc<AtomicBool>,
}

#[async_trait]
impl Plugin for Flaky {
    async fn init(&self, registrar: &mut Registrar<'_>) -> Result<(), BotError> {
        registrar.add_command("cmd", Noop).await?;
        if self.fail_init {
            return Err(BotError::InvalidInput("init refused".to_string()));
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BotError> {
        self.torn_down.store(true, Ordering::SeqCst);
        if self.fail_shutdown {
            return Err(BotError::Internal("teardown failed".to_string()));
        }
        Ok(())
    }
}

fn flaky_catalog(torn_down: &Arc<AtomicBool>) -> PluginCatalog {
    let (a, b) = (torn_down.clone(), torn_down.clone());
    PluginCatalog::new()
        .with("bad-init", move || {
            Box::new(Flaky {
                fail_init: true,
                fail_shutdown: false,
                torn_down: a.clone(),
            })
        })
        .with("bad-teardown", move || {
            Box::new(Flaky {
                fail_init: false,
                fail_shutdown: true,
                torn_down: b.clone(),
            })
        })
}

#[tokio::test]
async fn init_failure_propagates_unchanged_and_skips_teardown() {
    let torn_down = Arc::new(AtomicBool::new(false));
    let manager = manager_with(flaky_catalog(&torn_down), ConfigSource::memory(config(&[])), false);

    let err = manager.load("bad-init").await.unwrap_err();
    assert!(matches!(err, BotError::InvalidInput(_)));
    assert!(!manager.is_loaded("bad-init").await);
    assert!(manager.commands().is_empty());
    assert!(!torn_down.load(Ordering::SeqCst));
}

#[tokio::test]
async fn teardown_failure_still_removes_the_plugin() {
    let torn_down = Arc::new(AtomicBool::new(false));
    let manager = manager_with(flaky_catalog(&torn_down), ConfigSource::memory(config(&[])), false);
    manager.load("bad-teardown").await.unwrap();

    let err = manager.unload("bad-teardown").await.unwrap_err();
    assert!(matches!(err, BotError::Internal(_)));
    assert!(torn_down.load(Ordering::SeqCst));
    assert!(!manager.is_loaded("bad-teardown").await);
    assert!(manager.commands().find("cmd").is_none());

    manager.load("bad-teardown").await.unwrap();
    assert!(manager.commands().find("cmd").is_some());
}

#[tokio::test]
async fn reload_constructs_fresh_instances() {
    let torn_down = Arc::new(AtomicBool::new(false));
    let manager = manager_with(
        flaky_catalog(&torn_down),
        ConfigSource::memory(config(&["bad-teardown"])),
        false,
    );
    manager.load_all().await;
    let before = manager.commands().find("cmd").cloned().unwrap();

    let report = manager.reload().await;
    // The teardown error is reported, the plugin still comes back.
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.succeeded, ["bad-teardown"]);
    let after = manager.commands().find("cmd").cloned().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
}
