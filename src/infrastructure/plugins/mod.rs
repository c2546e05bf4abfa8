//! Plugin sources for the lifecycle manager
//!
//! Built-in plugins are registered as factories in the catalog. Additional
//! plugins can be shipped as shared libraries in the configured plugin
//! directory, each with a `plugin.yaml` manifest.

pub mod loader;
pub mod manifest;
pub mod registry;

pub use loader::{Instantiated, PluginLoader};
pub use manifest::PluginManifest;
pub use registry::{PluginCatalog, PluginFactory};
