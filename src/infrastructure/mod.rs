//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading and reloading
//! - Storage: Document persistence
//! - Adapters: Transport integrations
//! - Plugins: Plugin catalog and dynamic library loading

pub mod adapters;
pub mod config;
pub mod plugins;
pub mod storage;
