//! Plugin loading for modbot
//!
//! Plugins are shared libraries in the plugin directory. Each one embeds a
//! YAML descriptor naming the plugin and its entry point; the loader reads it,
//! creates the instance and gives the plugin a private data directory.

pub mod loader;
pub mod manifest;
pub mod module;

pub use loader::PluginLoader;
pub use manifest::{validate_name, PluginDescriptor};
pub use module::{DylibModule, DylibOpener, ModuleOpener, PluginModule};
