//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Events: Listener registry and priority dispatch
//! - Commands: Command parsing, routing, auditing and built-ins
//! - Bot: The host wiring everything together
//! - Errors: Domain-specific errors

pub mod bot;
pub mod commands;
pub mod errors;
pub mod events;

pub use bot::Bot;
