//! Command router - Resolves chat messages against the command tree
//!
//! Resolution walks the tree one token at a time. A command's permission is
//! checked before its sub-commands are looked at, so a denied parent never
//! reaches its children. Tokens that match no sub-command are handed to the
//! current command as plain arguments.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, error};
use super::audit::{AuditEntry, AuditOutcome, AuditSink};
use super::builtin::ADMIN_ROLE;
use super::parser::CommandParser;
use super::registry::CommandRegistry;
use crate::application::errors::panic_message;
use crate::domain::entities::{Actor, Command, CommandContext, EventPriority, HandlerResult, Listener, MessageReceived};
use crate::domain::traits::Channel;

/// Name of the listener that feeds chat messages into the router
pub const COMMAND_LISTENER: &str = "internal-command-listener";

pub struct CommandRouter {
    parser: CommandParser,
    registry: Arc<CommandRegistry>,
    audit: Arc<dyn AuditSink>,
    admins: Vec<String>,
}

impl CommandRouter {
    pub fn new(parser: CommandParser, registry: Arc<CommandRegistry>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            parser,
            registry,
            audit,
            admins: Vec::new(),
        }
    }

    /// Actor ids that are granted the admin role while routing
    pub fn with_admins<I, S>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admins = admins.into_iter().map(Into::into).collect();
        self
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// A `Highest`-priority listener routing every [`MessageReceived`]
    pub fn listener(self: &Arc<Self>) -> Listener {
        let router = Arc::clone(self);
        Listener::new(COMMAND_LISTENER).on::<MessageReceived, _>(EventPriority::Highest, move |msg| {
            router.route(&msg.actor, &msg.text, &msg.channel);
            Ok(())
        })
    }

    /// Route one message; `true` if it resolved to a command
    ///
    /// A resolved command counts as handled even when permission was denied
    /// or its hook failed.
    pub fn route(&self, actor: &Actor, raw: &str, channel: &Arc<dyn Channel>) -> bool {
        let Some(tokens) = self.parser.parse(raw) else {
            return false;
        };
        let Some((key, args)) = tokens.split_first() else {
            return false;
        };
        let Some(command) = self.registry.find(key) else {
            debug!("No command matches '{}'", key);
            return false;
        };

        let actor = self.elevate(actor);
        self.resolve(&command, &actor, raw, channel, args);
        true
    }

    fn elevate<'a>(&self, actor: &'a Actor) -> Cow<'a, Actor> {
        if !actor.has_role(ADMIN_ROLE) && self.admins.iter().any(|id| *id == actor.id) {
            Cow::Owned(actor.clone().with_role(ADMIN_ROLE))
        } else {
            Cow::Borrowed(actor)
        }
    }

    fn resolve(&self, command: &Arc<Command>, actor: &Actor, raw: &str, channel: &Arc<dyn Channel>, args: &[String]) {
        let ctx = CommandContext {
            actor,
            raw,
            channel,
            command: &command.name,
        };

        if !command.permits(actor) {
            self.audit(command, actor, raw, AuditOutcome::PermissionDenied);
            self.run_hook(command, "on_permission_denied", || command.deny(&ctx, args));
            return;
        }

        if let Some((first, rest)) = args.split_first() {
            if let Some(sub) = command.find_sub_command(first) {
                return self.resolve(&sub, actor, raw, channel, rest);
            }
        }

        self.audit(command, actor, raw, AuditOutcome::Executed);
        self.run_hook(command, "on_command", || command.execute(&ctx, args));
    }

    fn audit(&self, command: &Command, actor: &Actor, raw: &str, outcome: AuditOutcome) {
        self.audit.record(&AuditEntry {
            timestamp: Utc::now(),
            actor_id: actor.id.clone(),
            actor_name: actor.display_name().to_string(),
            command: command.name.clone(),
            raw: raw.to_string(),
            outcome,
        });
    }

    fn run_hook(&self, command: &Command, hook: &str, f: impl FnOnce() -> HandlerResult) {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(command = %command.name, command_id = %command.id(), "{} failed: {}", hook, e);
            }
            Err(payload) => {
                error!(
                    command = %command.name,
                    command_id = %command.id(),
                    "{} panicked: {}",
                    hook,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}
