//! Plugin loader - Dynamically loads plugins from shared libraries
//!
//! A plugin directory `<dir>/<name>/` holds a `plugin.yaml` manifest and a
//! shared library exporting [`CREATE_SYMBOL`]. The library stays mapped while
//! the returned handle (or any command it registered) is alive; once the
//! plugin is unloaded everywhere, the next load maps the file again.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};

use super::manifest::{PluginManifest, MANIFEST_FILE};
use crate::application::errors::PluginError;
use crate::plugins::Plugin;

/// Exported constructor symbol
pub const CREATE_SYMBOL: &[u8] = b"selfbot_plugin_create";

/// Signature of the exported constructor. Returns a leaked `Box<Box<dyn Plugin>>`.
pub type PluginCreateFn = unsafe extern "C" fn() -> *mut Box<dyn Plugin>;

/// A freshly constructed plugin plus whatever keeps its code alive
pub struct Instantiated {
    pub plugin: Box<dyn Plugin>,
    pub origin: Option<Arc<dyn Any + Send + Sync>>,
}

/// Plugin loader
pub struct PluginLoader {
    plugin_dir: PathBuf,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
        }
    }

    /// Whether `name` has a manifest under the plugin directory
    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugin_dir.join(name).join(MANIFEST_FILE).is_file()
    }

    /// Load a plugin by name
    pub fn load(&self, name: &str) -> Result<Instantiated, PluginError> {
        let dir = self.plugin_dir.join(name);
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(PluginError::Unknown(name.to_string()));
        }

        let manifest = PluginManifest::from_file(&manifest_path)?;
        if manifest.name != name {
            return Err(PluginError::Load(format!(
                "Manifest in {} declares name {:?}",
                dir.display(),
                manifest.name
            )));
        }

        let library_path = self.library_path(&dir, &manifest);
        if !library_path.exists() {
            return Err(PluginError::Load(format!("Library not found: {}", library_path.display())));
        }

        // SAFETY: the library is trusted plugin code built against this crate.
        let library = unsafe {
            Library::new(&library_path)
                .map_err(|e| PluginError::Load(format!("Failed to load library: {}", e)))?
        };

        let plugin = unsafe {
            let create: Symbol<PluginCreateFn> = library
                .get(CREATE_SYMBOL)
                .map_err(|e| PluginError::Load(format!("Failed to find constructor: {}", e)))?;
            let raw = create();
            if raw.is_null() {
                return Err(PluginError::Load("Plugin constructor returned null".to_string()));
            }
            *Box::from_raw(raw)
        };

        tracing::info!("Mapped plugin library {} v{}", manifest.name, manifest.version);

        Ok(Instantiated {
            plugin,
            origin: Some(Arc::new(library)),
        })
    }

    fn library_path(&self, dir: &Path, manifest: &PluginManifest) -> PathBuf {
        match &manifest.library {
            Some(lib) => dir.join(lib),
            None => dir.join(libloading::library_filename(format!("selfbot_{}", manifest.name))),
        }
    }
}
