//! Event dispatcher - Routes events to listener handlers by priority
//!
//! For one event the dispatcher:
//!
//! 1. Snapshots the live listeners
//! 2. Picks every handler declared for the event's exact type
//! 3. Buckets them by priority and runs `Highest` first, `Lowest` last
//!
//! Inside a bucket, handlers run in listener registration order, then in the
//! order the listener declared them. A failing or panicking handler is logged
//! and skipped over; nothing can stop the remaining handlers from running.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, Level};
use crate::application::errors::panic_message;
use crate::domain::entities::{Event, EventPriority, HandlerEntry, Listener};
use super::registry::EventRegistry;

/// Counts from one dispatch call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub invoked: usize,
    pub failed: usize,
}

/// Dispatches events against an [`EventRegistry`]
#[derive(Clone)]
pub struct EventDispatcher {
    registry: Arc<EventRegistry>,
}

impl EventDispatcher {
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    /// Dispatch one event synchronously on the calling thread
    ///
    /// No registry lock is held while handlers run, so handlers may register
    /// listeners or dispatch further events. Listeners registered during the
    /// call only see later events.
    pub fn dispatch(&self, event: &dyn Event) -> DispatchSummary {
        let event_type = event.event_type();
        let event_name = event.event_name();
        let span = tracing::span!(Level::DEBUG, "dispatch", event = %event_name);
        let _enter = span.enter();

        let listeners = self.registry.snapshot();
        let mut buckets: [Vec<(&Listener, &HandlerEntry)>; 5] = Default::default();
        for listener in &listeners {
            for handler in listener.handlers() {
                if handler.handles(event_type) {
                    buckets[handler.priority().index()].push((listener.as_ref(), handler));
                }
            }
        }

        let mut summary = DispatchSummary::default();
        for (priority, bucket) in EventPriority::ALL.iter().zip(buckets.iter()) {
            for (listener, handler) in bucket {
                summary.invoked += 1;
                if !self.invoke(listener, handler, *priority, event) {
                    summary.failed += 1;
                }
            }
        }

        debug!("Dispatched to {} handler(s), {} failed", summary.invoked, summary.failed);
        summary
    }

    fn invoke(&self, listener: &Listener, handler: &HandlerEntry, priority: EventPriority, event: &dyn Event) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| handler.call(event))) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(
                    listener = %listener.name(),
                    listener_id = %listener.id(),
                    %priority,
                    "Handler for {} failed: {}",
                    handler.event_name(),
                    e
                );
                false
            }
            Err(payload) => {
                error!(
                    listener = %listener.name(),
                    listener_id = %listener.id(),
                    %priority,
                    "Handler for {} panicked: {}",
                    handler.event_name(),
                    panic_message(payload.as_ref())
                );
                false
            }
        }
    }
}
