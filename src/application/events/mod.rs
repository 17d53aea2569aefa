//! Event handling - Listener registry and priority dispatch

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{DispatchSummary, EventDispatcher};
pub use registry::EventRegistry;
