//! Listeners and their handler entries
//!
//! A listener is built once, up front, as a list of `(event type, priority,
//! handler)` entries:
//!
//! ```rust,ignore
//! let listener = Listener::new("greeter")
//!     .on::<MessageReceived, _>(EventPriority::Normal, |msg| {
//!         tracing::info!("{} said {}", msg.actor, msg.text);
//!         Ok(())
//!     })
//!     .on::<Ready, _>(EventPriority::Low, |_| Ok(()));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use super::event::{Event, EventPriority};
use crate::application::errors::BotError;

/// Result of one handler or command hook invocation
pub type HandlerResult = Result<(), BotError>;

type Callback = Box<dyn Fn(&dyn Event) -> HandlerResult + Send + Sync>;

/// Whatever keeps the code behind a callback mapped, usually a plugin module
pub type CodeOwner = Arc<dyn Any + Send + Sync>;

/// Identity of a listener, stable for its whole life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One handler bound to one concrete event type
pub struct HandlerEntry {
    event_type: TypeId,
    event_name: &'static str,
    priority: EventPriority,
    callback: Callback,
}

impl HandlerEntry {
    pub fn event_type(&self) -> TypeId {
        self.event_type
    }

    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    pub fn priority(&self) -> EventPriority {
        self.priority
    }

    pub fn handles(&self, event_type: TypeId) -> bool {
        self.event_type == event_type
    }

    pub fn call(&self, event: &dyn Event) -> HandlerResult {
        (self.callback)(event)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("event", &self.event_name)
            .field("priority", &self.priority)
            .finish()
    }
}

/// A named bundle of event handlers
pub struct Listener {
    id: ListenerId,
    name: String,
    handlers: Vec<HandlerEntry>,
    // Declared after `handlers` so the callbacks are dropped first
    owner: Option<CodeOwner>,
}

impl Listener {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ListenerId::new(),
            name: name.into(),
            handlers: Vec::new(),
            owner: None,
        }
    }

    /// Add a handler for events of exactly type `E`
    pub fn on<E, F>(mut self, priority: EventPriority, handler: F) -> Self
    where
        E: Event,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        let callback: Callback = Box::new(move |event: &dyn Event| {
            match event.downcast_ref::<E>() {
                Some(event) => handler(event),
                // The dispatcher only hands over matching types
                None => Ok(()),
            }
        });

        self.handlers.push(HandlerEntry {
            event_type: TypeId::of::<E>(),
            event_name: std::any::type_name::<E>(),
            priority,
            callback,
        });
        self
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handlers in declaration order
    pub fn handlers(&self) -> &[HandlerEntry] {
        &self.handlers
    }

    pub fn handles(&self, event_type: TypeId) -> bool {
        self.handlers.iter().any(|h| h.handles(event_type))
    }

    /// Keep `owner` alive for as long as this listener is
    pub(crate) fn set_owner(&mut self, owner: CodeOwner) {
        self.owner = Some(owner);
    }

    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("handlers", &self.handlers)
            .field("owned", &self.owner.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Ping(u32);
    struct Pong;

    #[test]
    fn test_on_records_type_and_priority() {
        let listener = Listener::new("test")
            .on::<Ping, _>(EventPriority::High, |_| Ok(()))
            .on::<Pong, _>(EventPriority::Lowest, |_| Ok(()));

        let handlers = listener.handlers();
        assert_eq!(handlers.len(), 2);
        assert!(handlers[0].handles(TypeId::of::<Ping>()));
        assert_eq!(handlers[0].priority(), EventPriority::High);
        assert!(handlers[1].handles(TypeId::of::<Pong>()));
        assert!(!listener.handles(TypeId::of::<String>()));
    }

    #[test]
    fn test_call_downcasts_event() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let listener = Listener::new("test").on::<Ping, _>(EventPriority::Normal, move |p| {
            s.store(p.0 as usize, Ordering::SeqCst);
            Ok(())
        });

        listener.handlers()[0].call(&Ping(7)).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);

        // A foreign type is ignored rather than misread
        listener.handlers()[0].call(&Pong).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Listener::new("a").id(), Listener::new("a").id());
    }
}
