//! # Typed Notification Dispatch
//!
//! One sink trait and one source trait per notification kind. Components
//! implement [`EventSink`]; the host (or [`EventDispatcher`] in-process)
//! implements [`EventSource`].
//!
//! Sinks run in subscription order. [`EventControl::Stop`] ends delivery of
//! that notification to later sinks.

use bruiser_shared::EventControl;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives notifications of kind `E`.
///
/// Implementations must be total: log and return, never panic.
pub trait EventSink<E>: Send + Sync {
    /// Handles one notification.
    fn process_event(&self, event: &E) -> EventControl;
}

/// Identifies a subscription for later removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SinkHandle(u64);

/// Something sinks can subscribe to.
pub trait EventSource<E>: Send + Sync {
    /// Subscribes a sink. `None` if the source refused it.
    fn add_sink(&self, sink: Arc<dyn EventSink<E>>) -> Option<SinkHandle>;

    /// Unsubscribes. Returns `false` if the handle was unknown.
    fn remove_sink(&self, handle: SinkHandle) -> bool;
}

/// In-process [`EventSource`].
pub struct EventDispatcher<E: 'static> {
    sinks: RwLock<Vec<(SinkHandle, Arc<dyn EventSink<E>>)>>,
    next_handle: AtomicU64,
}

impl<E: 'static> EventDispatcher<E> {
    /// Creates a dispatcher with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Delivers `event` to every sink until one answers `Stop`.
    ///
    /// Sinks may subscribe or unsubscribe from inside `process_event`; the
    /// change applies from the next notification on.
    pub fn dispatch(&self, event: &E) -> EventControl {
        let snapshot: Vec<Arc<dyn EventSink<E>>> = self
            .sinks
            .read()
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect();

        for sink in snapshot {
            if sink.process_event(event) == EventControl::Stop {
                return EventControl::Stop;
            }
        }
        EventControl::Continue
    }

    /// Number of subscribed sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }
}

impl<E: 'static> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventSource<E> for EventDispatcher<E> {
    fn add_sink(&self, sink: Arc<dyn EventSink<E>>) -> Option<SinkHandle> {
        let handle = SinkHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.sinks.write().push((handle, sink));
        Some(handle)
    }

    fn remove_sink(&self, handle: SinkHandle) -> bool {
        let mut sinks = self.sinks.write();
        let before = sinks.len();
        sinks.retain(|(h, _)| *h != handle);
        sinks.len() != before
    }
}

impl<E: 'static> std::fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("sinks", &self.sink_count())
            .finish()
    }
}
