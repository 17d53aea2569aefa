//! Command registry - Holds the top-level commands

use std::sync::{Arc, PoisonError, RwLock};
use crate::application::errors::CommandError;
use crate::domain::entities::command::ensure_unique;
use crate::domain::entities::{Command, CommandId};

/// Top-level commands in registration order
///
/// Names and aliases are unique across top-level commands, ignoring case.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<Vec<Arc<Command>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, command: Arc<Command>) -> Result<(), CommandError> {
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        ensure_unique(&commands, &command)?;
        tracing::debug!("Registered command '{}' ({})", command.name, command.id());
        commands.push(command);
        Ok(())
    }

    pub fn unregister(&self, id: CommandId) -> Option<Arc<Command>> {
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        let index = commands.iter().position(|c| c.id() == id)?;
        let command = commands.remove(index);
        tracing::debug!("Unregistered command '{}' ({})", command.name, id);
        Some(command)
    }

    pub fn contains(&self, id: CommandId) -> bool {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|c| c.id() == id)
    }

    /// First command answering to `input` by name or alias
    pub fn find(&self, input: &str) -> Option<Arc<Command>> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.matches(input))
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<Arc<Command>> {
        self.commands.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.commands.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
