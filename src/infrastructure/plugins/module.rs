//! Plugin modules - Opened code units that can produce plugin instances
//!
//! A module exports two things: a `plugin_descriptor` function returning the
//! YAML descriptor as a NUL-terminated string, and a static
//! [`PluginEntry`] under the name the descriptor's `main` key gives. Both are
//! generated by [`declare_plugin!`](crate::declare_plugin).

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use libloading::{Library, Symbol};
use crate::application::errors::{panic_message, LoadError};
use crate::plugins::{is_compatible, Plugin, PluginEntry, PLUGIN_API_VERSION};

/// Symbol every plugin module exports its descriptor under
pub const DESCRIPTOR_SYMBOL: &[u8] = b"plugin_descriptor";

type DescriptorFn = unsafe extern "C" fn() -> *const c_char;

/// An opened module
///
/// Must stay alive for as long as any instance it created.
pub trait PluginModule: Send + Sync {
    fn path(&self) -> &Path;

    /// The embedded descriptor document, if the module has one
    fn descriptor(&self) -> Option<String>;

    /// Create a plugin instance from the entry point named `entry`
    fn instantiate(&self, entry: &str) -> Result<Box<dyn Plugin>, LoadError>;
}

/// Opens modules from disk
pub trait ModuleOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PluginModule>, LoadError>;
}

/// Opens shared libraries with `libloading`
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibOpener;

impl ModuleOpener for DylibOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn PluginModule>, LoadError> {
        // Safety: loading runs the library's initializers; plugin
        // directories are trusted.
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Box::new(DylibModule {
            path: path.to_path_buf(),
            library,
        }))
    }
}

/// A shared library opened by [`DylibOpener`]
pub struct DylibModule {
    path: PathBuf,
    library: Library,
}

impl PluginModule for DylibModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn descriptor(&self) -> Option<String> {
        unsafe {
            let describe: Symbol<DescriptorFn> = self.library.get(DESCRIPTOR_SYMBOL).ok()?;
            descriptor_text(*describe)
        }
    }

    fn instantiate(&self, entry: &str) -> Result<Box<dyn Plugin>, LoadError> {
        let entry_point = unsafe {
            let symbol: Symbol<*const PluginEntry> =
                self.library
                    .get(entry.as_bytes())
                    .map_err(|e| LoadError::EntryPointNotFound {
                        entry: entry.to_string(),
                        message: e.to_string(),
                    })?;
            entry_at(*symbol, entry)?
        };

        create_instance(entry, entry_point)
    }
}

/// Call a module's descriptor function; `None` if it hands back null
///
/// # Safety
///
/// `describe` must return null or a NUL-terminated string that outlives the call.
unsafe fn descriptor_text(describe: DescriptorFn) -> Option<String> {
    let raw = describe();
    if raw.is_null() {
        return None;
    }
    Some(CStr::from_ptr(raw).to_string_lossy().into_owned())
}

/// Borrow the entry a resolved symbol points at
///
/// # Safety
///
/// A non-null `ptr` must point at a `PluginEntry` that lives as long as `'a`.
unsafe fn entry_at<'a>(ptr: *const PluginEntry, entry: &str) -> Result<&'a PluginEntry, LoadError> {
    if ptr.is_null() {
        return Err(LoadError::EntryPointNotFound {
            entry: entry.to_string(),
            message: "symbol resolved to null".to_string(),
        });
    }
    Ok(&*ptr)
}

/// Check the entry's API version and run its factory
pub fn create_instance(entry: &str, entry_point: &PluginEntry) -> Result<Box<dyn Plugin>, LoadError> {
    if !is_compatible(entry_point.api_version) {
        return Err(LoadError::TypeMismatch {
            entry: entry.to_string(),
            found: entry_point.api_version,
            expected: PLUGIN_API_VERSION,
        });
    }

    panic::catch_unwind(AssertUnwindSafe(entry_point.create)).map_err(|payload| LoadError::InstantiationFailed {
        entry: entry.to_string(),
        message: panic_message(payload.as_ref()),
    })
}
