//! Bot host - Owns the registries, the router and the plugin manager
//!
//! ```rust,ignore
//! let bot = Bot::new(Config::load("config.yaml")?)?;
//! bot.start()?;
//! bot.run(&ConsoleGateway::new("modbot")).await?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use super::commands::builtin::{help_command, plugins_command};
use super::commands::{AuditSink, CommandParser, CommandRegistry, CommandRouter, NullAuditSink, TracingAuditSink};
use super::errors::BotError;
use super::events::{DispatchSummary, EventDispatcher, EventRegistry};
use crate::domain::entities::{Event, Ready};
use crate::domain::traits::Gateway;
use crate::infrastructure::audit::FileAuditSink;
use crate::infrastructure::config::Config;
use crate::infrastructure::plugins::PluginLoader;
use crate::plugins::{PluginHandle, PluginManager};

pub struct Bot {
    config: Config,
    events: Arc<EventRegistry>,
    commands: Arc<CommandRegistry>,
    dispatcher: EventDispatcher,
    router: Arc<CommandRouter>,
    plugins: Arc<PluginManager>,
    loader: PluginLoader,
    running: AtomicBool,
}

impl Bot {
    pub fn new(config: Config) -> Result<Self, BotError> {
        let loader = PluginLoader::new(config.plugins.directory.clone());
        Self::with_loader(config, loader)
    }

    /// Host with a custom plugin loader
    pub fn with_loader(config: Config, loader: PluginLoader) -> Result<Self, BotError> {
        config.validate()?;

        let events = Arc::new(EventRegistry::new());
        let commands = Arc::new(CommandRegistry::new());
        let plugins = Arc::new(PluginManager::new(events.clone(), commands.clone()));
        let dispatcher = EventDispatcher::new(events.clone());

        let router = Arc::new(
            CommandRouter::new(
                CommandParser::new(config.bot.prefixes.iter().cloned()),
                commands.clone(),
                audit_sink(&config)?,
            )
            .with_admins(config.bot.admins.iter().cloned()),
        );
        events.register(Arc::new(router.listener()));

        let prefix = config.bot.prefixes.first().cloned().unwrap_or_default();
        commands.register(Arc::new(help_command(Arc::downgrade(&commands), prefix)))?;
        commands.register(Arc::new(plugins_command(Arc::downgrade(&plugins))?))?;

        Ok(Self {
            config,
            events,
            commands,
            dispatcher,
            router,
            plugins,
            loader,
            running: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    pub fn plugins(&self) -> &Arc<PluginManager> {
        &self.plugins
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Load plugins (when auto-load is on) and announce [`Ready`]
    pub fn start(&self) -> Result<(), BotError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(BotError::AlreadyRunning);
        }

        info!("Starting {}", self.config.bot.name);
        if self.config.plugins.auto_load {
            for plugin in self.loader.load_all() {
                if let Err(e) = self.plugins.register(plugin) {
                    warn!("Skipping plugin: {}", e);
                }
            }
        }

        self.dispatch(&Ready {
            plugins: self.plugins.len(),
        });
        info!("{} is ready with {} plugin(s)", self.config.bot.name, self.plugins.len());
        Ok(())
    }

    /// Unload every plugin
    pub fn stop(&self) -> Result<(), BotError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(BotError::NotRunning);
        }

        info!("Stopping {}", self.config.bot.name);
        self.plugins.unload_all_plugins();
        Ok(())
    }

    /// Register an in-process plugin
    pub fn register_plugin(&self, plugin: Arc<PluginHandle>) -> Result<(), BotError> {
        self.plugins.register(plugin)?;
        Ok(())
    }

    pub fn dispatch(&self, event: &dyn Event) -> DispatchSummary {
        self.dispatcher.dispatch(event)
    }

    /// Pump events from `gateway` until it closes or Ctrl-C is pressed
    ///
    /// The bot must be started; it is stopped on return.
    pub async fn run(&self, gateway: &dyn Gateway) -> Result<(), BotError> {
        if !self.is_running() {
            return Err(BotError::NotRunning);
        }

        gateway.start().await?;
        let gateway_info = gateway.info();
        info!("Listening on {} gateway", gateway_info.name);

        loop {
            tokio::select! {
                event = gateway.next_event() => match event {
                    Some(event) => {
                        self.dispatch(event.as_ref());
                    }
                    None => {
                        info!("Gateway closed");
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                    break;
                }
            }
        }

        self.stop()
    }
}

fn audit_sink(config: &Config) -> Result<Arc<dyn AuditSink>, BotError> {
    if !config.audit.enabled {
        return Ok(Arc::new(NullAuditSink));
    }
    match &config.audit.path {
        Some(path) => Ok(Arc::new(FileAuditSink::open(path)?)),
        None => Ok(Arc::new(TracingAuditSink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.plugins.directory = dir.to_path_buf();
        config
    }

    #[test]
    fn test_lifecycle_preconditions() {
        let dir = tempfile::tempdir().unwrap();
        let bot = Bot::new(config(dir.path())).unwrap();

        assert!(matches!(bot.stop(), Err(BotError::NotRunning)));
        bot.start().unwrap();
        assert!(matches!(bot.start(), Err(BotError::AlreadyRunning)));
        bot.stop().unwrap();
        assert!(matches!(bot.stop(), Err(BotError::NotRunning)));
    }

    #[test]
    fn test_builtins_and_router_are_wired() {
        let dir = tempfile::tempdir().unwrap();
        let bot = Bot::new(config(dir.path())).unwrap();

        assert!(bot.commands().find("help").is_some());
        assert!(bot.commands().find("plugins").is_some());
        assert_eq!(bot.events().len(), 1);
    }

    #[test]
    fn test_audit_file_is_created_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.audit.enabled = true;
        config.audit.path = Some(dir.path().join("logs/audit.log"));

        Bot::new(config).unwrap();
        assert!(dir.path().join("logs/audit.log").exists());
    }
}
