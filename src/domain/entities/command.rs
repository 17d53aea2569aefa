use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;
use super::{Actor, CodeOwner, HandlerResult};
use crate::application::errors::{BotError, CommandError};
use crate::domain::traits::Channel;

/// Hook invoked with the resolved argument tokens
pub type CommandHandler = Arc<dyn Fn(&CommandContext<'_>, &[String]) -> HandlerResult + Send + Sync>;

/// Predicate deciding whether an actor may run a command
pub type PermissionCheck = Arc<dyn Fn(&Actor) -> bool + Send + Sync>;

/// Everything a command hook gets to see about the invocation
pub struct CommandContext<'a> {
    pub actor: &'a Actor,
    /// The full message text, prefix included
    pub raw: &'a str,
    pub channel: &'a Arc<dyn Channel>,
    /// Name of the command whose hook is running
    pub command: &'a str,
}

impl CommandContext<'_> {
    pub fn reply(&self, text: &str) -> Result<(), BotError> {
        self.channel.send(text)
    }
}

/// Identity of a command, stable for its whole life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(Uuid);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a bot command and its sub-command tree
pub struct Command {
    id: CommandId,
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    permission: PermissionCheck,
    handler: Option<CommandHandler>,
    denied_handler: Option<CommandHandler>,
    sub_commands: RwLock<Vec<Arc<Command>>>,
    // Declared last so the hooks and sub-commands are dropped first
    owner: Option<CodeOwner>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CommandId(Uuid::new_v4()),
            name: name.into(),
            description: String::new(),
            aliases: Vec::new(),
            usage: None,
            permission: Arc::new(|_| true),
            handler: None,
            denied_handler: None,
            sub_commands: RwLock::new(Vec::new()),
            owner: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_permission<F>(mut self, check: F) -> Self
    where
        F: Fn(&Actor) -> bool + Send + Sync + 'static,
    {
        self.permission = Arc::new(check);
        self
    }

    /// Shorthand for a permission check on a single role
    pub fn require_role(self, role: impl Into<String>) -> Self {
        let role = role.into();
        self.with_permission(move |actor| actor.has_role(&role))
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandContext<'_>, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn on_permission_denied<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandContext<'_>, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        self.denied_handler = Some(Arc::new(handler));
        self
    }

    /// Builder form of [`Command::add_sub_command`]
    pub fn with_sub_command(self, sub: Command) -> Result<Self, CommandError> {
        self.add_sub_command(sub)?;
        Ok(self)
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Keep `owner` alive for as long as this command is
    pub(crate) fn set_owner(&mut self, owner: CodeOwner) {
        self.owner = Some(owner);
    }

    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    /// Name followed by aliases
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Case-insensitive match against the name or any alias
    pub fn matches(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.labels().any(|label| label.to_lowercase() == input_lower)
    }

    /// First label of `other` that this command already answers to
    pub fn conflicting_label<'a>(&self, other: &'a Command) -> Option<&'a str> {
        other.labels().find(|label| self.matches(label))
    }

    pub fn permits(&self, actor: &Actor) -> bool {
        (self.permission)(actor)
    }

    pub fn add_sub_command(&self, sub: Command) -> Result<Arc<Command>, CommandError> {
        let mut subs = self.sub_commands.write().unwrap_or_else(PoisonError::into_inner);
        ensure_unique(&subs, &sub)?;
        let sub = Arc::new(sub);
        subs.push(sub.clone());
        Ok(sub)
    }

    pub fn remove_sub_command(&self, id: CommandId) -> Option<Arc<Command>> {
        let mut subs = self.sub_commands.write().unwrap_or_else(PoisonError::into_inner);
        let index = subs.iter().position(|c| c.id == id)?;
        Some(subs.remove(index))
    }

    pub fn contains_sub_command(&self, id: CommandId) -> bool {
        self.sub_commands().iter().any(|c| c.id == id)
    }

    /// Snapshot of the direct sub-commands, in insertion order
    pub fn sub_commands(&self) -> Vec<Arc<Command>> {
        self.sub_commands.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn find_sub_command(&self, token: &str) -> Option<Arc<Command>> {
        self.sub_commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.matches(token))
            .cloned()
    }

    /// Run the command hook
    pub fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> HandlerResult {
        match &self.handler {
            Some(handler) => handler(ctx, args),
            None => {
                tracing::debug!("Command '{}' has no handler", self.name);
                Ok(())
            }
        }
    }

    /// Run the permission-denied hook
    pub fn deny(&self, ctx: &CommandContext<'_>, args: &[String]) -> HandlerResult {
        match &self.denied_handler {
            Some(handler) => handler(ctx, args),
            None => {
                tracing::debug!("{} may not use '{}'", ctx.actor, self.name);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("sub_commands", &self.sub_commands().len())
            .finish()
    }
}

/// Reject `candidate` if any of its labels collides with a sibling's
pub(crate) fn ensure_unique(siblings: &[Arc<Command>], candidate: &Command) -> Result<(), CommandError> {
    for sibling in siblings {
        if let Some(label) = sibling.conflicting_label(candidate) {
            return Err(CommandError::NameConflict {
                label: label.to_string(),
                existing: sibling.name.clone(),
            });
        }
    }
    Ok(())
}
