//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// Command prefixes, tried in order
    pub prefixes: Vec<String>,
    /// Actor ids granted the `admin` role
    pub admins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub auto_load: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AuditConfig {
    pub enabled: bool,
    /// Append records to this file instead of the log
    pub path: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "modbot".to_string(),
            prefixes: vec!["!".to_string()],
            admins: Vec::new(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            auto_load: true,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden from `BOT_PREFIX` and `BOT_PLUGINS_DIR`
    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            if !prefix.is_empty() {
                config.bot.prefixes = vec![prefix];
            }
        }

        if let Ok(dir) = std::env::var("BOT_PLUGINS_DIR") {
            config.plugins.directory = PathBuf::from(dir);
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefixes.is_empty() {
            return Err(ConfigError::InvalidValue("bot.prefixes must not be empty".to_string()));
        }
        if self.bot.prefixes.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidValue("bot.prefixes must not contain an empty prefix".to_string()));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bot.prefixes, ["!"]);
        assert_eq!(config.plugins.directory, PathBuf::from("./plugins"));
        assert!(config.plugins.auto_load);
        assert!(!config.audit.enabled);
    }

    #[test]
    fn test_parse_partial_document() {
        let config = Config::parse(
            "bot:\n  prefixes: ['!', 'bot ']\n  admins: ['42']\nplugins:\n  auto-load: false\n",
        )
        .unwrap();

        assert_eq!(config.bot.name, "modbot");
        assert_eq!(config.bot.prefixes, ["!", "bot "]);
        assert_eq!(config.bot.admins, ["42"]);
        assert!(!config.plugins.auto_load);
        assert_eq!(config.plugins.directory, PathBuf::from("./plugins"));
    }

    #[test]
    fn test_rejects_empty_prefixes() {
        assert!(matches!(Config::parse("bot:\n  prefixes: []\n"), Err(ConfigError::InvalidValue(_))));
        assert!(matches!(Config::parse("bot:\n  prefixes: ['']\n"), Err(ConfigError::InvalidValue(_))));
        assert!(matches!(Config::parse("bot: [\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_yaml_round_trip_keeps_kebab_case() {
        let yaml = Config::default().to_yaml().unwrap();
        assert!(yaml.contains("auto-load: true"));
        let back = Config::parse(&yaml).unwrap();
        assert_eq!(back.bot.prefixes, ["!"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "audit:\n  enabled: true\n  path: audit.log\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.audit.enabled);
        assert_eq!(config.audit.path, Some(PathBuf::from("audit.log")));
        assert!(matches!(Config::load(dir.path().join("missing.yaml")), Err(ConfigError::Read(_))));
    }
}
