//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::PluginError;

/// File name of the manifest inside a plugin directory
pub const MANIFEST_FILE: &str = "plugin.yaml";

/// Plugin metadata
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Plugin name (required, must match the directory name)
    pub name: String,

    /// Plugin version (required)
    pub version: String,

    pub description: Option<String>,

    /// Path to the shared library, relative to the plugin directory
    pub library: Option<PathBuf>,
}

impl PluginManifest {
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, PluginError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Load(format!("Failed to read manifest: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, PluginError> {
        serde_yaml::from_str(content)
            .map_err(|e| PluginError::Load(format!("Failed to parse manifest: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let manifest = PluginManifest::parse("name: weather\nversion: 0.2.0\n").unwrap();
        assert_eq!(manifest.name, "weather");
        assert_eq!(manifest.version, "0.2.0");
        assert!(manifest.library.is_none());
    }

    #[test]
    fn missing_version_is_a_load_error() {
        let err = PluginManifest::parse("name: weather\n").unwrap_err();
        assert!(matches!(err, PluginError::Load(_)));
    }
}
