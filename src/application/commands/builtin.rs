//! Built-in commands the host registers for itself

use std::sync::{Arc, Weak};
use super::registry::CommandRegistry;
use crate::application::errors::{BotError, CommandError};
use crate::domain::entities::{Command, CommandContext, HandlerResult};
use crate::plugins::PluginManager;

/// Role required for the `plugins` command
pub const ADMIN_ROLE: &str = "admin";

/// `help [command [sub-command...]]`
pub fn help_command(registry: Weak<CommandRegistry>, prefix: impl Into<String>) -> Command {
    let prefix = prefix.into();
    Command::new("help")
        .with_description("Show available commands")
        .with_aliases(["?"])
        .with_usage("help [command]")
        .with_handler(move |ctx, args| {
            let registry = upgrade(&registry)?;
            ctx.reply(&help_text(&registry, &prefix, args))
        })
}

/// Help for the command tree under `path`, or the top-level listing
pub fn help_text(registry: &CommandRegistry, prefix: &str, path: &[String]) -> String {
    let Some((first, rest)) = path.split_first() else {
        let mut help = "Available commands:".to_string();
        for cmd in registry.snapshot() {
            help.push_str(&format!("\n  {}{} - {}", prefix, cmd.name, describe(&cmd)));
        }
        return help;
    };

    let mut current = match registry.find(first) {
        Some(cmd) => cmd,
        None => return format!("Command {}{} not found", prefix, first),
    };
    let mut label = current.name.clone();
    for token in rest {
        match current.find_sub_command(token) {
            Some(sub) => {
                label = format!("{} {}", label, sub.name);
                current = sub;
            }
            None => break,
        }
    }

    let mut help = format!("{}{} - {}", prefix, label, describe(&current));
    if !current.aliases.is_empty() {
        help.push_str(&format!("\nAliases: {}", current.aliases.join(", ")));
    }
    if let Some(usage) = &current.usage {
        help.push_str(&format!("\nUsage: {}{}", prefix, usage));
    }
    let subs = current.sub_commands();
    if !subs.is_empty() {
        let names: Vec<&str> = subs.iter().map(|s| s.name.as_str()).collect();
        help.push_str(&format!("\nSub-commands: {}", names.join(", ")));
    }
    help
}

fn describe(cmd: &Command) -> &str {
    if cmd.description.is_empty() {
        "No description"
    } else {
        &cmd.description
    }
}

/// `plugins [list | reload <name> | unload <name>]`, admins only
pub fn plugins_command(manager: Weak<PluginManager>) -> Result<Command, CommandError> {
    let list_manager = manager.clone();
    let reload_manager = manager.clone();
    let unload_manager = manager.clone();

    Command::new("plugins")
        .with_description("Manage loaded plugins")
        .with_aliases(["pl"])
        .with_usage("plugins [list | reload <name> | unload <name>]")
        .require_role(ADMIN_ROLE)
        .on_permission_denied(|ctx, _| ctx.reply("You are not allowed to manage plugins"))
        .with_handler(move |ctx, _| {
            let manager = upgrade(&manager)?;
            list_plugins(ctx, &manager)
        })
        .with_sub_command(
            Command::new("list")
                .with_aliases(["ls"])
                .with_description("List registered plugins")
                .with_handler(move |ctx, _| {
                    let manager = upgrade(&list_manager)?;
                    list_plugins(ctx, &manager)
                }),
        )?
        .with_sub_command(
            Command::new("reload")
                .with_description("Disable and re-enable a plugin")
                .with_usage("plugins reload <name>")
                .with_handler(move |ctx, args| {
                    let Some(name) = args.first() else {
                        return ctx.reply("Usage: plugins reload <name>");
                    };
                    let manager = upgrade(&reload_manager)?;
                    match manager.get(name) {
                        Some(plugin) if manager.reload(&plugin) => {
                            ctx.reply(&format!("Reloaded plugin {}", plugin.name()))
                        }
                        _ => ctx.reply(&format!("Plugin {} is not registered", name)),
                    }
                }),
        )?
        .with_sub_command(
            Command::new("unload")
                .with_description("Unregister a plugin and drop its commands and listeners")
                .with_usage("plugins unload <name>")
                .with_handler(move |ctx, args| {
                    let Some(name) = args.first() else {
                        return ctx.reply("Usage: plugins unload <name>");
                    };
                    let manager = upgrade(&unload_manager)?;
                    match manager.unload(name) {
                        Ok(()) => ctx.reply(&format!("Unloaded plugin {}", name)),
                        Err(e) => ctx.reply(&e.to_string()),
                    }
                }),
        )
}

fn list_plugins(ctx: &CommandContext<'_>, manager: &PluginManager) -> HandlerResult {
    let plugins = manager.plugins();
    if plugins.is_empty() {
        return ctx.reply("No plugins loaded");
    }

    let mut text = format!("Plugins ({}):", plugins.len());
    for plugin in plugins {
        let meta = plugin.metadata();
        text.push_str(&format!("\n  {} {} - {}", meta.name, meta.version, plugin.state()));
    }
    ctx.reply(&text)
}

fn upgrade<T>(weak: &Weak<T>) -> Result<Arc<T>, BotError> {
    weak.upgrade()
        .ok_or_else(|| BotError::Internal("host has shut down".to_string()))
}
