//! modbot - a plugin-extensible chat bot framework
//!
//! Events from a [`Gateway`](domain::traits::Gateway) are dispatched to
//! listeners by priority. Chat messages are routed to commands by the
//! [`CommandRouter`](application::commands::CommandRouter), and plugins
//! loaded at runtime contribute both listeners and commands through the
//! [`PluginManager`](plugins::PluginManager).

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;

pub use application::errors::{BotError, CommandError, ConfigError, LoadError, PluginError};
pub use application::Bot;
