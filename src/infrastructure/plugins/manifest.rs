//! Plugin descriptor - The YAML document a plugin module embeds

use std::path::Path;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use crate::application::errors::LoadError;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());

/// Descriptor as written by the plugin author; every key is optional here
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawDescriptor {
    pub name: Option<String>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
}

/// A checked plugin descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    pub name: String,
    /// Exported entry point symbol
    pub main: String,
    pub description: String,
    pub version: String,
    pub author: String,
}

impl PluginDescriptor {
    /// Parse and check the descriptor of the module at `path`
    pub fn parse(source: &str, path: &Path) -> Result<Self, LoadError> {
        let raw: RawDescriptor =
            serde_yaml::from_str(source).map_err(|e| LoadError::DescriptorParse(e.to_string()))?;

        let main = raw
            .main
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| LoadError::EntryPointUnspecified(path.to_path_buf()))?;
        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| LoadError::NameUnspecified(path.to_path_buf()))?;
        validate_name(&name)?;

        Ok(Self {
            name,
            main,
            description: raw.description.unwrap_or_default(),
            version: raw.version.unwrap_or_default(),
            author: raw.author.unwrap_or_default(),
        })
    }
}

/// Plugin names become directory names
pub fn validate_name(name: &str) -> Result<(), LoadError> {
    if name == "." || name == ".." || !NAME_PATTERN.is_match(name) {
        return Err(LoadError::InvalidName(name.to_string()));
    }
    Ok(())
}
