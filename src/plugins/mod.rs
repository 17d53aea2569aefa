//! Plugin system for modbot
//!
//! Plugins contribute listeners and commands to the running bot. They are
//! usually loaded from shared libraries by
//! [`PluginLoader`](crate::infrastructure::plugins::PluginLoader), but any
//! type implementing [`Plugin`] can be wrapped in a [`PluginHandle`] and
//! registered directly.

pub mod handle;
pub mod manager;
pub mod trait_def;

pub use handle::PluginHandle;
pub use manager::PluginManager;
pub use trait_def::{is_compatible, Plugin, PluginContext, PluginEntry, PluginMetadata, PluginState, PLUGIN_API_VERSION};
