//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from any thread, with or without a runtime.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Consumers:
//!   Node 1 ────┐
//!   Node 2 ────┼──────► Bus ───────► dataflow listener ──► SubscriberSet
//!   Node N ────┤  (broadcast chan)
//!   Dataflow ──┘                 └──► bus.subscribe() (user receivers)
//! ```
//!
//! ## Rules
//! - `publish()` returns at once, also from executor threads outside any runtime.
//! - One ring buffer of `capacity` events is shared by all receivers; a receiver that
//!   falls behind gets `RecvError::Lagged(n)` and loses the `n` oldest events.
//! - Without receivers, published events are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel carrying node and dataflow events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// Capacity is shared across all receivers and clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// New receiver; sees only events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
