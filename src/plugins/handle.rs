//! Plugin handle - A plugin instance together with its metadata and state

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use super::trait_def::{Plugin, PluginMetadata, PluginState};
use crate::domain::entities::CodeOwner;
use crate::infrastructure::plugins::PluginModule;

/// A loaded plugin
///
/// Handles are shared as `Arc<PluginHandle>` and compared by pointer, so two
/// handles with equal metadata are still different plugins.
pub struct PluginHandle {
    metadata: PluginMetadata,
    state: Mutex<PluginState>,
    instance: Mutex<Box<dyn Plugin>>,
    // Dropped after `instance`, whose code may live in the module
    module: Option<Arc<dyn PluginModule>>,
}

impl PluginHandle {
    /// Wrap an in-process plugin instance
    pub fn new(metadata: PluginMetadata, instance: Box<dyn Plugin>) -> Self {
        Self {
            metadata,
            state: Mutex::new(PluginState::Loaded),
            instance: Mutex::new(instance),
            module: None,
        }
    }

    /// Wrap an instance created from `module`, keeping the module open
    pub fn from_module(metadata: PluginMetadata, instance: Box<dyn Plugin>, module: Box<dyn PluginModule>) -> Self {
        Self {
            module: Some(Arc::from(module)),
            ..Self::new(metadata, instance)
        }
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn directory(&self) -> &Path {
        &self.metadata.directory
    }

    pub fn state(&self) -> PluginState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: PluginState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Share of the module the plugin's code lives in, if any
    ///
    /// Listeners and commands the plugin registers hold one, so the module
    /// stays open until the last of them is gone, even after the handle is.
    pub(crate) fn code_owner(&self) -> Option<CodeOwner> {
        let module = self.module.clone()?;
        Some(Arc::new(module))
    }

    pub(crate) fn instance(&self) -> MutexGuard<'_, Box<dyn Plugin>> {
        self.instance.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("metadata", &self.metadata)
            .field("state", &self.state())
            .field("module", &self.module.is_some())
            .finish()
    }
}
