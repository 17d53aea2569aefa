//! Command handling - Parsing, registry, routing and auditing of chat commands

pub mod audit;
pub mod builtin;
pub mod parser;
pub mod registry;
pub mod router;

pub use audit::{AuditEntry, AuditOutcome, AuditSink, NullAuditSink, TracingAuditSink};
pub use parser::CommandParser;
pub use registry::CommandRegistry;
pub use router::{CommandRouter, COMMAND_LISTENER};
