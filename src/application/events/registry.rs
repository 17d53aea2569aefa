//! Event registry - Holds the active listeners

use std::sync::{Arc, PoisonError, RwLock};
use crate::domain::entities::{Listener, ListenerId};

/// Ordered set of active listeners
///
/// Order is registration order and is what the dispatcher uses inside a
/// priority bucket.
#[derive(Default)]
pub struct EventRegistry {
    listeners: RwLock<Vec<Arc<Listener>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; returns `false` if it is already registered
    pub fn register(&self, listener: Arc<Listener>) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if listeners.iter().any(|l| l.id() == listener.id()) {
            return false;
        }
        tracing::debug!("Registered listener '{}' ({})", listener.name(), listener.id());
        listeners.push(listener);
        true
    }

    pub fn unregister(&self, id: ListenerId) -> Option<Arc<Listener>> {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let index = listeners.iter().position(|l| l.id() == id)?;
        let listener = listeners.remove(index);
        tracing::debug!("Unregistered listener '{}' ({})", listener.name(), id);
        Some(listener)
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|l| l.id() == id)
    }

    pub fn get(&self, id: ListenerId) -> Option<Arc<Listener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|l| l.id() == id)
            .cloned()
    }

    /// Copy of the current listeners, safe to iterate while others mutate
    pub fn snapshot(&self) -> Vec<Arc<Listener>> {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
