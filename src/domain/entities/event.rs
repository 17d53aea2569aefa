//! Events and handler priorities
//!
//! Any `'static + Send + Sync` value is an event. Handlers bind to one concrete
//! type and are matched by exact `TypeId`; a handler for `MessageReceived`
//! never sees a wrapper type around it, and vice versa.
//!
//! `Box<dyn Event>` is itself `Any`, so always pass `boxed.as_ref()` to the
//! dispatcher, never `&boxed`.

use std::any::{Any, TypeId};
use std::fmt;

/// A value that can travel through the dispatcher
pub trait Event: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Type name used in log lines
    fn event_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn event_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn Event {
    /// Runtime type of the concrete event behind the trait object
    pub fn event_type(&self) -> TypeId {
        self.as_any().type_id()
    }

    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }
}

/// Handler priority; handlers run from `Highest` down to `Lowest`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EventPriority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
}

impl EventPriority {
    /// Invocation order
    pub const ALL: [EventPriority; 5] = [
        EventPriority::Highest,
        EventPriority::High,
        EventPriority::Normal,
        EventPriority::Low,
        EventPriority::Lowest,
    ];

    /// Bucket index, 0 for `Highest`
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventPriority::Highest => "highest",
            EventPriority::High => "high",
            EventPriority::Normal => "normal",
            EventPriority::Low => "low",
            EventPriority::Lowest => "lowest",
        }
    }
}

impl fmt::Display for EventPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted once the host has started and plugins are registered
#[derive(Debug, Clone)]
pub struct Ready {
    pub plugins: usize,
}
