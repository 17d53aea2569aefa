//! Plugin trait definitions

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use super::handle::PluginHandle;
use super::manager::PluginManager;
use crate::application::errors::PluginError;
use crate::domain::entities::{Command, CommandId, HandlerResult, Listener, ListenerId};

/// Version of the plugin ABI the host understands
///
/// The high half is the major version and must match exactly; the low half
/// is the minor version and the host accepts anything up to its own.
pub const PLUGIN_API_VERSION: u32 = 0x0001_0000;

/// Whether a module built against `version` can be hosted
pub fn is_compatible(version: u32) -> bool {
    version >> 16 == PLUGIN_API_VERSION >> 16 && version & 0xffff <= PLUGIN_API_VERSION & 0xffff
}

/// Core plugin trait that all plugins must implement
///
/// Hooks run with the plugin's instance locked. They may register and
/// unregister listeners and commands through the context, but must not call
/// back into lifecycle operations such as [`PluginManager::reload`].
pub trait Plugin: Send + 'static {
    /// Called once the plugin is registered, and again after every reload
    fn enable(&mut self, ctx: &PluginContext<'_>) -> HandlerResult;

    /// Called on unregister, on reload and on shutdown
    fn disable(&mut self, _ctx: &PluginContext<'_>) -> HandlerResult {
        Ok(())
    }
}

/// Host-assigned description of a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    /// Private data directory, `<plugins_dir>/<name>/`
    pub directory: PathBuf,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: String::new(),
            author: String::new(),
            directory: directory.into(),
        }
    }
}

/// Lifecycle state of a plugin handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Loaded,
    Registered,
    Reloading,
    Unregistered,
}

impl PluginState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginState::Loaded => "loaded",
            PluginState::Registered => "registered",
            PluginState::Reloading => "reloading",
            PluginState::Unregistered => "unregistered",
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a plugin gets to see while one of its hooks runs
pub struct PluginContext<'a> {
    manager: &'a PluginManager,
    plugin: &'a Arc<PluginHandle>,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(manager: &'a PluginManager, plugin: &'a Arc<PluginHandle>) -> Self {
        Self { manager, plugin }
    }

    pub fn metadata(&self) -> &PluginMetadata {
        self.plugin.metadata()
    }

    pub fn directory(&self) -> &Path {
        &self.plugin.metadata().directory
    }

    pub fn handle(&self) -> &Arc<PluginHandle> {
        self.plugin
    }

    pub fn manager(&self) -> &PluginManager {
        self.manager
    }

    pub fn register_listener(&self, listener: Listener) -> Result<ListenerId, PluginError> {
        self.manager.register_listener(self.plugin, listener)
    }

    pub fn register_command(&self, command: Command) -> Result<Arc<Command>, PluginError> {
        self.manager.register_command(self.plugin, command)
    }

    pub fn unregister_listener(&self, id: ListenerId) -> bool {
        self.manager.unregister_listener(self.plugin, id)
    }

    pub fn unregister_command(&self, id: CommandId) -> bool {
        self.manager.unregister_command(self.plugin, id)
    }
}

/// Exported entry point of a plugin module
///
/// The descriptor's `main` key names a static of this type. Use
/// [`declare_plugin!`](crate::declare_plugin) rather than writing one by hand.
#[repr(C)]
pub struct PluginEntry {
    pub api_version: u32,
    pub create: fn() -> Box<dyn Plugin>,
}

/// Export a plugin type from a `cdylib`
///
/// ```rust,ignore
/// modbot::declare_plugin!(GREETER, Greeter::default(), "
/// name: greeter
/// main: GREETER
/// version: 1.0.0
/// ");
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($entry:ident, $ctor:expr, $descriptor:literal) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static $entry: $crate::plugins::PluginEntry = $crate::plugins::PluginEntry {
            api_version: $crate::plugins::PLUGIN_API_VERSION,
            create: {
                fn create() -> ::std::boxed::Box<dyn $crate::plugins::Plugin> {
                    ::std::boxed::Box::new($ctor)
                }
                create
            },
        };

        #[no_mangle]
        pub extern "C" fn plugin_descriptor() -> *const ::std::os::raw::c_char {
            concat!($descriptor, "\0").as_ptr() as *const ::std::os::raw::c_char
        }
    };
}
