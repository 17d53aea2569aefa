//! Plugin manager - handles plugin lifecycle and the contributions plugins make
//!
//! Every listener and command a plugin registers through the manager is
//! tracked in an ownership map, so a plugin can be torn down completely
//! without its cooperation. Locks are always taken in the order plugin list,
//! ownership map, live registry.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, error, info};
use super::handle::PluginHandle;
use super::trait_def::{PluginContext, PluginState};
use crate::application::commands::CommandRegistry;
use crate::application::errors::{panic_message, PluginError};
use crate::application::events::EventRegistry;
use crate::domain::entities::{Command, CommandId, Listener, ListenerId};

#[derive(Debug, Clone, Copy)]
enum Hook {
    Enable,
    Disable,
}

impl Hook {
    fn as_str(self) -> &'static str {
        match self {
            Hook::Enable => "enable",
            Hook::Disable => "disable",
        }
    }
}

/// Manages all plugins for the bot
pub struct PluginManager {
    lifecycle: Mutex<()>,
    plugins: RwLock<Vec<Arc<PluginHandle>>>,
    listener_owners: Mutex<HashMap<ListenerId, Arc<PluginHandle>>>,
    command_owners: Mutex<HashMap<CommandId, Arc<PluginHandle>>>,
    events: Arc<EventRegistry>,
    commands: Arc<CommandRegistry>,
}

impl PluginManager {
    pub fn new(events: Arc<EventRegistry>, commands: Arc<CommandRegistry>) -> Self {
        Self {
            lifecycle: Mutex::new(()),
            plugins: RwLock::new(Vec::new()),
            listener_owners: Mutex::new(HashMap::new()),
            command_owners: Mutex::new(HashMap::new()),
            events,
            commands,
        }
    }

    pub fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    /// Register a plugin and enable it
    ///
    /// Fails with [`PluginError::NameInUse`] if a plugin of the same name,
    /// ignoring case, is already registered; nothing is changed in that case.
    pub fn register(&self, plugin: Arc<PluginHandle>) -> Result<(), PluginError> {
        let _guard = self.lifecycle();
        {
            let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
            let name = plugin.name().to_lowercase();
            if plugins.iter().any(|p| p.name().to_lowercase() == name) {
                return Err(PluginError::NameInUse(plugin.name().to_string()));
            }
            plugin.set_state(PluginState::Registered);
            plugins.push(plugin.clone());
        }

        info!("Registering plugin: {} {}", plugin.name(), plugin.metadata().version);
        self.run_hook(&plugin, Hook::Enable);
        Ok(())
    }

    /// Disable a plugin and forget it
    ///
    /// Listeners and commands the plugin registered stay in place; see
    /// [`PluginManager::unload`] for a full teardown.
    pub fn unregister(&self, plugin: &Arc<PluginHandle>) -> Result<(), PluginError> {
        let _guard = self.lifecycle();
        if !self.contains(plugin) {
            return Err(PluginError::NotRegistered(plugin.name().to_string()));
        }

        self.run_hook(plugin, Hook::Disable);
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p| !Arc::ptr_eq(p, plugin));
        plugin.set_state(PluginState::Unregistered);
        info!("Unregistered plugin: {}", plugin.name());
        Ok(())
    }

    /// Disable then re-enable a registered plugin; `false` if it isn't registered
    pub fn reload(&self, plugin: &Arc<PluginHandle>) -> bool {
        let _guard = self.lifecycle();
        if !self.contains(plugin) {
            return false;
        }

        plugin.set_state(PluginState::Reloading);
        self.run_hook(plugin, Hook::Disable);
        self.run_hook(plugin, Hook::Enable);
        plugin.set_state(PluginState::Registered);
        info!("Reloaded plugin: {}", plugin.name());
        true
    }

    /// Unregister the named plugin and drop everything it contributed
    pub fn unload(&self, name: &str) -> Result<(), PluginError> {
        let plugin = self
            .get(name)
            .ok_or_else(|| PluginError::NotRegistered(name.to_string()))?;
        self.unregister(&plugin)?;
        let removed = self.remove_contributions(&plugin);
        debug!("Removed {} contributions of plugin {}", removed, plugin.name());
        Ok(())
    }

    /// Tear down every plugin
    ///
    /// All plugin-owned listeners and commands leave the live registries
    /// first, then each plugin is disabled in registration order. The manager
    /// is empty afterwards, so a second call does nothing.
    pub fn unload_all_plugins(&self) {
        let _guard = self.lifecycle();
        let plugins: Vec<Arc<PluginHandle>> = {
            let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
            {
                let mut owners = lock(&self.listener_owners);
                for (id, _) in owners.drain() {
                    self.events.unregister(id);
                }
            }
            {
                let mut owners = lock(&self.command_owners);
                for (id, _) in owners.drain() {
                    self.commands.unregister(id);
                }
            }
            plugins.drain(..).collect()
        };

        if plugins.is_empty() {
            return;
        }

        info!("Unloading {} plugins", plugins.len());
        for plugin in &plugins {
            self.run_hook(plugin, Hook::Disable);
            plugin.set_state(PluginState::Unregistered);
        }
    }

    /// Add a listener to the live registry on behalf of `plugin`
    ///
    /// The listener keeps the plugin's module open, so a dispatch already
    /// holding it can finish after the plugin is unloaded.
    pub fn register_listener(&self, plugin: &Arc<PluginHandle>, mut listener: Listener) -> Result<ListenerId, PluginError> {
        let plugins = self.plugins.read().unwrap_or_else(PoisonError::into_inner);
        if !plugins.iter().any(|p| Arc::ptr_eq(p, plugin)) {
            return Err(PluginError::NotRegistered(plugin.name().to_string()));
        }

        if let Some(owner) = plugin.code_owner() {
            listener.set_owner(owner);
        }
        let mut owners = lock(&self.listener_owners);
        let id = listener.id();
        self.events.register(Arc::new(listener));
        owners.insert(id, plugin.clone());
        debug!("Plugin {} registered listener {}", plugin.name(), id);
        Ok(id)
    }

    /// Add a top-level command to the live registry on behalf of `plugin`
    ///
    /// A name or alias clash surfaces as [`PluginError::Command`] and nothing
    /// is recorded.
    pub fn register_command(&self, plugin: &Arc<PluginHandle>, mut command: Command) -> Result<Arc<Command>, PluginError> {
        let plugins = self.plugins.read().unwrap_or_else(PoisonError::into_inner);
        if !plugins.iter().any(|p| Arc::ptr_eq(p, plugin)) {
            return Err(PluginError::NotRegistered(plugin.name().to_string()));
        }

        if let Some(owner) = plugin.code_owner() {
            command.set_owner(owner);
        }
        let mut owners = lock(&self.command_owners);
        let command = Arc::new(command);
        self.commands.register(command.clone())?;
        owners.insert(command.id(), plugin.clone());
        debug!("Plugin {} registered command '{}'", plugin.name(), command.name);
        Ok(command)
    }

    /// Remove a listener `plugin` owns; `false` if it owns no such listener
    pub fn unregister_listener(&self, plugin: &Arc<PluginHandle>, id: ListenerId) -> bool {
        let mut owners = lock(&self.listener_owners);
        match owners.get(&id) {
            Some(owner) if Arc::ptr_eq(owner, plugin) => {
                owners.remove(&id);
                self.events.unregister(id);
                true
            }
            _ => false,
        }
    }

    /// Remove a command `plugin` owns; `false` if it owns no such command
    pub fn unregister_command(&self, plugin: &Arc<PluginHandle>, id: CommandId) -> bool {
        let mut owners = lock(&self.command_owners);
        match owners.get(&id) {
            Some(owner) if Arc::ptr_eq(owner, plugin) => {
                owners.remove(&id);
                self.commands.unregister(id);
                true
            }
            _ => false,
        }
    }

    /// Drop every listener and command `plugin` owns; returns how many
    pub fn remove_contributions(&self, plugin: &Arc<PluginHandle>) -> usize {
        let mut removed = 0;
        {
            let mut owners = lock(&self.listener_owners);
            owners.retain(|id, owner| {
                if Arc::ptr_eq(owner, plugin) {
                    self.events.unregister(*id);
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        {
            let mut owners = lock(&self.command_owners);
            owners.retain(|id, owner| {
                if Arc::ptr_eq(owner, plugin) {
                    self.commands.unregister(*id);
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    /// Registered plugin by name, ignoring case
    pub fn get(&self, name: &str) -> Option<Arc<PluginHandle>> {
        let name = name.to_lowercase();
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.name().to_lowercase() == name)
            .cloned()
    }

    pub fn contains(&self, plugin: &Arc<PluginHandle>) -> bool {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| Arc::ptr_eq(p, plugin))
    }

    /// Registered plugins in registration order
    pub fn plugins(&self) -> Vec<Arc<PluginHandle>> {
        self.plugins.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.plugins.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `plugin` owns the listener `id`
    pub fn contains_listener(&self, plugin: &Arc<PluginHandle>, id: ListenerId) -> bool {
        lock(&self.listener_owners)
            .get(&id)
            .is_some_and(|owner| Arc::ptr_eq(owner, plugin))
    }

    /// Whether `plugin` owns the command `id`
    pub fn contains_command(&self, plugin: &Arc<PluginHandle>, id: CommandId) -> bool {
        lock(&self.command_owners)
            .get(&id)
            .is_some_and(|owner| Arc::ptr_eq(owner, plugin))
    }

    pub fn listeners_of(&self, plugin: &Arc<PluginHandle>) -> Vec<ListenerId> {
        lock(&self.listener_owners)
            .iter()
            .filter(|(_, owner)| Arc::ptr_eq(owner, plugin))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn commands_of(&self, plugin: &Arc<PluginHandle>) -> Vec<CommandId> {
        lock(&self.command_owners)
            .iter()
            .filter(|(_, owner)| Arc::ptr_eq(owner, plugin))
            .map(|(id, _)| *id)
            .collect()
    }

    fn lifecycle(&self) -> MutexGuard<'_, ()> {
        lock(&self.lifecycle)
    }

    fn run_hook(&self, plugin: &Arc<PluginHandle>, hook: Hook) {
        let ctx = PluginContext::new(self, plugin);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut instance = plugin.instance();
            match hook {
                Hook::Enable => instance.enable(&ctx),
                Hook::Disable => instance.disable(&ctx),
            }
        }));

        let message = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        let err = PluginError::Hook {
            plugin: plugin.name().to_string(),
            hook: hook.as_str(),
            message,
        };
        error!(plugin = %plugin.name(), "{}", err);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::{CommandParser, CommandRouter, NullAuditSink};
    use crate::application::errors::{BotError, LoadError};
    use crate::application::events::EventDispatcher;
    use crate::domain::entities::{Actor, EventPriority, HandlerResult};
    use crate::domain::traits::Channel;
    use crate::infrastructure::plugins::PluginModule;
    use crate::plugins::{Plugin, PluginMetadata};
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Registers one listener and one command named after itself on enable
    struct Recorder {
        name: String,
        log: Log,
        panic_on_enable: bool,
    }

    impl Plugin for Recorder {
        fn enable(&mut self, ctx: &PluginContext<'_>) -> HandlerResult {
            self.log
                .lock()
                .unwrap()
                .push(format!("enable:{}:{}", self.name, ctx.handle().state()));
            if self.panic_on_enable {
                panic!("enable blew up");
            }
            ctx.register_listener(Listener::new(self.name.clone()).on::<String, _>(EventPriority::Normal, |_| Ok(())))?;
            ctx.register_command(Command::new(self.name.clone()))?;
            Ok(())
        }

        fn disable(&mut self, ctx: &PluginContext<'_>) -> HandlerResult {
            self.log
                .lock()
                .unwrap()
                .push(format!("disable:{}:{}", self.name, ctx.handle().state()));
            Ok(())
        }
    }

    fn manager() -> PluginManager {
        PluginManager::new(Arc::new(EventRegistry::new()), Arc::new(CommandRegistry::new()))
    }

    fn plugin(name: &str, log: &Log) -> Arc<PluginHandle> {
        Arc::new(PluginHandle::new(
            PluginMetadata::new(name, format!("plugins/{}", name)),
            Box::new(Recorder {
                name: name.to_string(),
                log: log.clone(),
                panic_on_enable: false,
            }),
        ))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_register_enables_and_tracks_contributions() {
        let log = Log::default();
        let manager = manager();
        let greeter = plugin("greeter", &log);

        manager.register(greeter.clone()).unwrap();

        assert_eq!(greeter.state(), PluginState::Registered);
        assert_eq!(entries(&log), ["enable:greeter:registered"]);
        assert_eq!(manager.events().len(), 1);
        assert!(manager.commands().find("greeter").is_some());
        assert_eq!(manager.listeners_of(&greeter).len(), 1);
        assert_eq!(manager.commands_of(&greeter).len(), 1);
    }

    #[test]
    fn test_name_in_use_has_no_side_effects() {
        let log = Log::default();
        let manager = manager();
        manager.register(plugin("greeter", &log)).unwrap();

        let clash = plugin("GREETER", &log);
        let err = manager.register(clash.clone()).unwrap_err();

        assert!(matches!(err, PluginError::NameInUse(ref name) if name == "GREETER"));
        assert_eq!(clash.state(), PluginState::Loaded);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.events().len(), 1);
        assert_eq!(manager.commands().len(), 1);
        assert_eq!(entries(&log), ["enable:greeter:registered"]);
    }

    #[test]
    fn test_unload_all_plugins_tears_down_everything_once() {
        let log = Log::default();
        let manager = manager();
        let first = plugin("first", &log);
        let second = plugin("second", &log);
        manager.register(first.clone()).unwrap();
        manager.register(second.clone()).unwrap();
        log.lock().unwrap().clear();

        manager.unload_all_plugins();

        assert!(manager.is_empty());
        assert!(manager.events().is_empty());
        assert!(manager.commands().is_empty());
        assert!(manager.listeners_of(&first).is_empty());
        assert!(manager.commands_of(&second).is_empty());
        assert_eq!(entries(&log), ["disable:first:registered", "disable:second:registered"]);
        assert_eq!(first.state(), PluginState::Unregistered);

        manager.unload_all_plugins();
        assert_eq!(entries(&log).len(), 2);
    }

    #[test]
    fn test_unload_all_leaves_host_contributions() {
        let log = Log::default();
        let manager = manager();
        manager.register(plugin("first", &log)).unwrap();
        manager.commands().register(Arc::new(Command::new("help"))).unwrap();

        manager.unload_all_plugins();

        assert_eq!(manager.commands().len(), 1);
        assert!(manager.commands().find("help").is_some());
    }

    #[test]
    fn test_unregister_listener_is_idempotent() {
        let log = Log::default();
        let manager = manager();
        let greeter = plugin("greeter", &log);
        let other = plugin("other", &log);
        manager.register(greeter.clone()).unwrap();
        manager.register(other.clone()).unwrap();
        let id = manager.listeners_of(&greeter)[0];

        assert!(!manager.unregister_listener(&other, id));
        assert!(manager.events().contains(id));

        assert!(manager.contains_listener(&greeter, id));
        assert!(!manager.contains_listener(&other, id));
        assert!(manager.unregister_listener(&greeter, id));
        assert!(!manager.events().contains(id));
        assert!(!manager.contains_listener(&greeter, id));
        assert!(!manager.unregister_listener(&greeter, id));
    }

    #[test]
    fn test_unregister_command_requires_owner() {
        let log = Log::default();
        let manager = manager();
        let greeter = plugin("greeter", &log);
        let other = plugin("other", &log);
        manager.register(greeter.clone()).unwrap();
        manager.register(other.clone()).unwrap();
        let id = manager.commands_of(&greeter)[0];

        assert!(!manager.unregister_command(&other, id));
        assert!(!manager.contains_command(&other, id));
        assert!(manager.contains_command(&greeter, id));
        assert!(manager.unregister_command(&greeter, id));
        assert!(!manager.contains_command(&greeter, id));
        assert!(!manager.commands().contains(id));
        assert!(!manager.unregister_command(&greeter, id));
    }

    #[test]
    fn test_contributions_require_registered_plugin() {
        let log = Log::default();
        let manager = manager();
        let loose = plugin("loose", &log);

        let err = manager.register_listener(&loose, Listener::new("l")).unwrap_err();
        assert!(matches!(err, PluginError::NotRegistered(_)));
        let err = manager.register_command(&loose, Command::new("c")).unwrap_err();
        assert!(matches!(err, PluginError::NotRegistered(_)));
        assert!(manager.events().is_empty());
        assert!(manager.commands().is_empty());
    }

    #[test]
    fn test_command_conflict_is_not_recorded() {
        let log = Log::default();
        let manager = manager();
        let greeter = plugin("greeter", &log);
        manager.register(greeter.clone()).unwrap();

        let err = manager.register_command(&greeter, Command::new("x").with_aliases(["GREETER"])).unwrap_err();

        assert!(matches!(err, PluginError::Command(_)));
        assert_eq!(manager.commands_of(&greeter).len(), 1);
        assert_eq!(manager.commands().len(), 1);
    }

    #[test]
    fn test_reload_passes_through_reloading() {
        let log = Log::default();
        let manager = manager();
        let greeter = plugin("greeter", &log);

        assert!(!manager.reload(&greeter));
        assert!(entries(&log).is_empty());

        manager.register(greeter.clone()).unwrap();
        // Drop the command so re-enabling can register it again
        let id = manager.commands_of(&greeter)[0];
        manager.unregister_command(&greeter, id);
        log.lock().unwrap().clear();

        assert!(manager.reload(&greeter));
        assert_eq!(entries(&log), ["disable:greeter:reloading", "enable:greeter:reloading"]);
        assert_eq!(greeter.state(), PluginState::Registered);
    }

    #[test]
    fn test_unregister_keeps_contributions() {
        let log = Log::default();
        let manager = manager();
        let greeter = plugin("greeter", &log);
        manager.register(greeter.clone()).unwrap();

        manager.unregister(&greeter).unwrap();

        assert!(!manager.contains(&greeter));
        assert_eq!(greeter.state(), PluginState::Unregistered);
        assert_eq!(manager.events().len(), 1);
        assert!(matches!(manager.unregister(&greeter), Err(PluginError::NotRegistered(_))));

        assert_eq!(manager.remove_contributions(&greeter), 2);
        assert!(manager.events().is_empty());
    }

    #[test]
    fn test_unload_by_name() {
        let log = Log::default();
        let manager = manager();
        manager.register(plugin("greeter", &log)).unwrap();

        manager.unload("Greeter").unwrap();

        assert!(manager.is_empty());
        assert!(manager.events().is_empty());
        assert!(manager.commands().is_empty());
        assert!(matches!(manager.unload("greeter"), Err(PluginError::NotRegistered(_))));
    }

    #[test]
    fn test_panicking_enable_is_contained() {
        let log = Log::default();
        let manager = manager();
        let broken = Arc::new(PluginHandle::new(
            PluginMetadata::new("broken", "plugins/broken"),
            Box::new(Recorder {
                name: "broken".to_string(),
                log: log.clone(),
                panic_on_enable: true,
            }),
        ));

        manager.register(broken.clone()).unwrap();

        assert!(manager.contains(&broken));
        assert!(manager.get("BROKEN").is_some());
        manager.unload_all_plugins();
        assert_eq!(entries(&log), ["enable:broken:registered", "disable:broken:registered"]);
    }

    #[test]
    fn test_hook_error_does_not_abort_lifecycle() {
        struct Failing;

        impl Plugin for Failing {
            fn enable(&mut self, _ctx: &PluginContext<'_>) -> HandlerResult {
                Err(BotError::handler("no config"))
            }
        }

        let manager = manager();
        let failing = Arc::new(PluginHandle::new(PluginMetadata::new("failing", "plugins/failing"), Box::new(Failing)));

        manager.register(failing.clone()).unwrap();
        assert!(manager.contains(&failing));
        assert!(manager.reload(&failing));
    }

    /// Module stand-in that logs when it is closed
    struct TrackedModule {
        log: Log,
    }

    impl PluginModule for TrackedModule {
        fn path(&self) -> &Path {
            Path::new("libtracked.so")
        }

        fn descriptor(&self) -> Option<String> {
            None
        }

        fn instantiate(&self, entry: &str) -> Result<Box<dyn Plugin>, LoadError> {
            Err(LoadError::EntryPointNotFound {
                entry: entry.to_string(),
                message: "not a real module".to_string(),
            })
        }
    }

    impl Drop for TrackedModule {
        fn drop(&mut self) {
            self.log.lock().unwrap().push("module closed".to_string());
        }
    }

    #[test]
    fn test_contributions_keep_module_open_after_unload() {
        let log = Log::default();
        let manager = manager();
        let tracked = Arc::new(PluginHandle::from_module(
            PluginMetadata::new("tracked", "plugins/tracked"),
            Box::new(Recorder {
                name: "tracked".to_string(),
                log: log.clone(),
                panic_on_enable: false,
            }),
            Box::new(TrackedModule { log: log.clone() }),
        ));
        manager.register(tracked.clone()).unwrap();
        assert!(manager.events().snapshot().iter().all(|l| l.has_owner()));
        assert!(manager.commands().snapshot().iter().all(|c| c.has_owner()));

        // A dispatch in flight still holds the listener
        let in_flight = manager.events().snapshot();
        manager.unload("tracked").unwrap();
        drop(tracked);
        assert!(!entries(&log).contains(&"module closed".to_string()));

        in_flight[0].handlers()[0].call(&"late".to_string()).unwrap();
        drop(in_flight);
        assert_eq!(entries(&log).last().map(String::as_str), Some("module closed"));
    }

    #[test]
    fn test_in_process_contributions_have_no_owner() {
        let log = Log::default();
        let manager = manager();
        manager.register(plugin("greeter", &log)).unwrap();

        assert!(manager.events().snapshot().iter().all(|l| !l.has_owner()));
    }

    #[test]
    fn test_concurrent_register_admits_one_name() {
        let log = Log::default();
        let manager = manager();

        let admitted = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|i| {
                    let candidate = plugin(if i % 2 == 0 { "greeter" } else { "GREETER" }, &log);
                    let manager = &manager;
                    scope.spawn(move || manager.register(candidate).is_ok())
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).filter(|ok| *ok).count()
        });

        assert_eq!(admitted, 1);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.commands().len(), 1);
        assert_eq!(manager.events().len(), 1);
        assert_eq!(entries(&log).len(), 1);
    }

    struct NullChannel;

    impl Channel for NullChannel {
        fn id(&self) -> &str {
            "null"
        }

        fn send(&self, _text: &str) -> Result<(), BotError> {
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_and_route_while_plugins_come_and_go() {
        let log = Log::default();
        let manager = manager();
        let dispatcher = EventDispatcher::new(manager.events().clone());
        let router = CommandRouter::new(
            CommandParser::new(["!"]),
            manager.commands().clone(),
            Arc::new(NullAuditSink),
        );
        let channel: Arc<dyn Channel> = Arc::new(NullChannel);

        let host_calls = Arc::new(AtomicUsize::new(0));
        let calls = host_calls.clone();
        manager.events().register(Arc::new(Listener::new("host").on::<String, _>(EventPriority::Low, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })));

        let done = AtomicBool::new(false);
        let dispatched = thread::scope(|scope| {
            let readers: Vec<_> = (0..3)
                .map(|_| {
                    scope.spawn(|| {
                        let mut rounds = 0;
                        while !done.load(Ordering::SeqCst) {
                            dispatcher.dispatch(&"tick".to_string());
                            router.route(&Actor::new("1"), "!alpha now", &channel);
                            rounds += 1;
                        }
                        rounds
                    })
                })
                .collect();

            for _ in 0..50 {
                manager.register(plugin("alpha", &log)).unwrap();
                manager.register(plugin("beta", &log)).unwrap();
                manager.unload("alpha").unwrap();
                manager.unload_all_plugins();
            }
            done.store(true, Ordering::SeqCst);

            readers.into_iter().map(|r| r.join().unwrap()).sum::<usize>()
        });

        assert_eq!(host_calls.load(Ordering::SeqCst), dispatched);
        assert!(manager.is_empty());
        assert_eq!(manager.events().len(), 1);
        assert!(manager.commands().is_empty());
        let enables = entries(&log).iter().filter(|l| l.starts_with("enable:")).count();
        assert_eq!(enables, 100);
    }
}
