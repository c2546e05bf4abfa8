//! Plugin catalog - Resolves plugin names to fresh instances

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::loader::{Instantiated, PluginLoader};
use crate::application::errors::PluginError;
use crate::plugins::Plugin;

/// Constructor for a built-in plugin
pub type PluginFactory = Arc<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Catalog of plugins that can be instantiated by name
///
/// Built-in factories win; otherwise the configured plugin directory is
/// searched for a dynamically loadable plugin. Every call builds a new
/// instance, so a reload never reuses a discarded one.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    builtins: BTreeMap<String, PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built-in plugin constructor
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.builtins.insert(name.into(), Arc::new(factory));
    }

    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn builtin_names(&self) -> Vec<String> {
        self.builtins.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str, plugin_dir: Option<&Path>) -> bool {
        self.builtins.contains_key(name)
            || plugin_dir.is_some_and(|dir| PluginLoader::new(dir).has_plugin(name))
    }

    /// Construct a new instance of `name`
    pub fn instantiate(&self, name: &str, plugin_dir: Option<&Path>) -> Result<Instantiated, PluginError> {
        if let Some(factory) = self.builtins.get(name) {
            return Ok(Instantiated {
                plugin: factory(),
                origin: None,
            });
        }

        match plugin_dir {
            Some(dir) => PluginLoader::new(dir).load(name),
            None => Err(PluginError::Unknown(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::BotError;
    use crate::plugins::Registrar;
    use async_trait::async_trait;

    struct Empty;

    #[async_trait]
    impl Plugin for Empty {
        async fn init(&self, _registrar: &mut Registrar<'_>) -> Result<(), BotError> {
            Ok(())
        }
    }

    #[test]
    fn builtins_instantiate_without_origin() {
        let catalog = PluginCatalog::new().with("empty", || Box::new(Empty));
        let made = catalog.instantiate("empty", None).unwrap();
        assert!(made.origin.is_none());
        assert!(catalog.contains("empty", None));
        assert_eq!(catalog.builtin_names(), vec!["empty"]);
    }

    #[test]
    fn unknown_name_without_directory() {
        let catalog = PluginCatalog::new();
        assert_eq!(
            catalog.instantiate("nope", None).err(),
            Some(PluginError::Unknown("nope".to_string()))
        );
    }
}
