//! Domain entities - Core business objects

pub mod actor;
pub mod command;
pub mod event;
pub mod listener;
pub mod message;

pub use actor::Actor;
pub use command::{Command, CommandContext, CommandHandler, CommandId, PermissionCheck};
pub use event::{Event, EventPriority, Ready};
pub use listener::{CodeOwner, HandlerEntry, HandlerResult, Listener, ListenerId};
pub use message::MessageReceived;
