//! Domain layer - Core types shared by the dispatcher, router and plugins
//!
//! This layer contains:
//! - Entities: Actor, events, listeners, commands
//! - Traits: Abstractions for the chat platform (Gateway, Channel)

pub mod entities;
pub mod traits;
