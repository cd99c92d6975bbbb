//! # Subscriber trait for node and dataflow events.
//!
//! Implement [`Subscribe`] to observe what the nodes of a [`Dataflow`](crate::Dataflow)
//! are doing: starts, firings, completions, failures.
//!
//! ```text
//! Bus ──► listener ──► SubscriberSet ──► lane (bounded mpsc) ──► on_event(&Event)
//! ```
//!
//! ## Rules
//! - Every subscriber owns one lane and one tokio task; lanes never wait on each other.
//! - A full lane loses the event for that subscriber and emits `SubscriberOverflow`.
//! - A panic inside `on_event` is caught and emitted as `SubscriberPanicked`; the lane
//!   keeps running.
//! - Within one lane, events arrive in publish order.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use pinflow::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::NodeFailed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of lifecycle events.
///
/// `on_event` runs on a tokio worker: prefer async I/O and keep errors to yourself.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic events. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's lane (at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
