//! Application layer errors

use std::any::Any;
use std::path::PathBuf;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Bot is already running")]
    AlreadyRunning,

    #[error("Bot is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Shorthand for a failing handler or hook
    pub fn handler(msg: impl Into<String>) -> Self {
        BotError::Handler(msg.into())
    }
}

/// Command registration and execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("'{label}' is already used by sibling command '{existing}'")]
    NameConflict { label: String, existing: String },
}

/// Plugin lifecycle errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("A plugin is already registered with the name {0}")]
    NameInUse(String),

    #[error("Plugin not registered: {0}")]
    NotRegistered(String),

    #[error("Plugin '{plugin}' failed during {hook}: {message}")]
    Hook {
        plugin: String,
        hook: &'static str,
        message: String,
    },

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors raised while turning a module on disk into a plugin handle
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not open module {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Could not load {0}, plugin descriptor not found")]
    DescriptorMissing(PathBuf),

    #[error("Could not parse plugin descriptor: {0}")]
    DescriptorParse(String),

    #[error("Could not load {0}, main entry point not specified")]
    EntryPointUnspecified(PathBuf),

    #[error("Could not load {0}, plugin name not specified")]
    NameUnspecified(PathBuf),

    #[error("Invalid plugin name '{0}'")]
    InvalidName(String),

    #[error("Entry point '{entry}' not found: {message}")]
    EntryPointNotFound { entry: String, message: String },

    #[error("Entry point '{entry}' could not be instantiated: {message}")]
    InstantiationFailed { entry: String, message: String },

    #[error("Entry point '{entry}' does not provide a compatible plugin (api version {found:#010x}, host {expected:#010x})")]
    TypeMismatch {
        entry: String,
        found: u32,
        expected: u32,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Best-effort text of a caught panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
