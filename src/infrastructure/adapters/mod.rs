//! Platform adapters

pub mod console;

pub use console::{ConsoleChannel, ConsoleGateway};
