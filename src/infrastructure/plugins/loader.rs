//! Plugin loader - Dynamically loads plugins from shared libraries

use std::path::{Path, PathBuf};
use std::sync::Arc;
use super::manifest::PluginDescriptor;
use super::module::{DylibOpener, ModuleOpener, PluginModule};
use crate::application::errors::LoadError;
use crate::plugins::{PluginHandle, PluginMetadata};

/// Plugin loader
pub struct PluginLoader {
    plugin_dir: PathBuf,
    opener: Box<dyn ModuleOpener>,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self::with_opener(plugin_dir, DylibOpener)
    }

    /// Loader backed by a custom module opener
    pub fn with_opener(plugin_dir: impl Into<PathBuf>, opener: impl ModuleOpener + 'static) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            opener: Box::new(opener),
        }
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Private data directory for the plugin called `name`
    pub fn data_dir(&self, name: &str) -> PathBuf {
        self.plugin_dir.join(name)
    }

    /// Read a module's descriptor without creating a plugin instance
    pub fn read_descriptor(&self, path: impl AsRef<Path>) -> Result<PluginDescriptor, LoadError> {
        let path = path.as_ref();
        let module = self.opener.open(path)?;
        Self::descriptor_of(module.as_ref(), path)
    }

    /// Load a single plugin module
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<PluginHandle>, LoadError> {
        let path = path.as_ref();
        let module = self.opener.open(path)?;
        let descriptor = Self::descriptor_of(module.as_ref(), path)?;
        let instance = module.instantiate(&descriptor.main)?;

        let directory = self.data_dir(&descriptor.name);
        std::fs::create_dir_all(&directory).map_err(|source| LoadError::Io {
            path: directory.clone(),
            source,
        })?;

        let metadata = PluginMetadata {
            name: descriptor.name,
            description: descriptor.description,
            version: descriptor.version,
            author: descriptor.author,
            directory,
        };
        tracing::info!("Loaded plugin: {} {} from {}", metadata.name, metadata.version, path.display());

        Ok(Arc::new(PluginHandle::from_module(metadata, instance, module)))
    }

    /// Module files in the plugin directory, in file-name order
    pub fn discover(&self) -> Result<Vec<PathBuf>, LoadError> {
        let mut candidates = Vec::new();

        if !self.plugin_dir.exists() {
            tracing::warn!("Plugin directory does not exist: {}", self.plugin_dir.display());
            return Ok(candidates);
        }

        let entries = std::fs::read_dir(&self.plugin_dir).map_err(|source| LoadError::Io {
            path: self.plugin_dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            // Directories hold plugin data
            if !path.is_file() {
                continue;
            }

            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
            }

            let is_module = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION));
            if is_module {
                candidates.push(path);
            }
        }

        candidates.sort();
        Ok(candidates)
    }

    /// Load every module in the plugin directory
    ///
    /// Modules that fail to load are logged and skipped.
    pub fn load_all(&self) -> Vec<Arc<PluginHandle>> {
        let candidates = match self.discover() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Failed to scan plugin directory: {}", e);
                return Vec::new();
            }
        };

        let mut plugins = Vec::new();
        for path in candidates {
            match self.load(&path) {
                Ok(plugin) => plugins.push(plugin),
                Err(e) => {
                    tracing::error!("Failed to load plugin from {}: {}", path.display(), e);
                }
            }
        }
        plugins
    }

    fn descriptor_of(module: &dyn PluginModule, path: &Path) -> Result<PluginDescriptor, LoadError> {
        let source = module
            .descriptor()
            .ok_or_else(|| LoadError::DescriptorMissing(path.to_path_buf()))?;
        PluginDescriptor::parse(&source, path)
    }
}
