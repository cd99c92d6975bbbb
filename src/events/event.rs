//! # Runtime events emitted by nodes, dataflows and subscriber workers.
//!
//! [`EventKind`] groups into three families:
//! - **Node events**: lifecycle and firings of a single node
//! - **Dataflow events**: group-level terminal states
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! ## Ordering
//! `seq` comes from one process-wide counter. Subscribers see events through separate
//! lanes, so sort by `seq` when the relative order of two lanes matters.
//!
//! ## Example
//! ```rust
//! use pinflow::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::NodeFailed)
//!     .with_node("multiply")
//!     .with_firing(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::NodeFailed);
//! assert_eq!(ev.node.as_deref(), Some("multiply"));
//! assert_eq!(ev.firing, Some(3));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Source of `Event::seq`.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Node events ===
    /// Node was started and its control pin released.
    ///
    /// Sets:
    /// - `node`: node name
    NodeStarted,

    /// All pins became ready and a firing was handed to the executor.
    ///
    /// Sets:
    /// - `node`: node name
    /// - `firing`: firing number (1-based)
    FiringScheduled,

    /// The action returned normally.
    ///
    /// Sets:
    /// - `node`: node name
    /// - `firing`: firing number
    FiringCompleted,

    /// The action failed or panicked; the node is stopped.
    ///
    /// Sets:
    /// - `node`: node name
    /// - `firing`: firing number
    /// - `reason`: failure message
    NodeFailed,

    /// The node stopped without a failure (explicit stop, one-shot without a value).
    ///
    /// Sets:
    /// - `node`: node name
    NodeStopped,

    /// The node produced its result.
    ///
    /// Sets:
    /// - `node`: node name
    /// - `firing`: firing that completed the node
    NodeCompleted,

    // === Dataflow events ===
    /// Every counted node of a dataflow finished.
    DataflowCompleted,

    /// A node of the dataflow failed.
    ///
    /// Sets:
    /// - `node`: name of the failed node
    /// - `reason`: failure message
    DataflowFailed,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `node`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `node`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,
}

impl EventKind {
    /// True for events after which the node never fires again.
    pub fn is_node_terminal(self) -> bool {
        matches!(
            self,
            EventKind::NodeFailed | EventKind::NodeStopped | EventKind::NodeCompleted
        )
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the node (or subscriber), if applicable.
    pub node: Option<Arc<str>>,
    /// Firing number of the node (starting from 1).
    pub firing: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            node: None,
            firing: None,
            reason: None,
        }
    }

    /// Attaches a node name.
    #[inline]
    pub fn with_node(mut self, node: impl Into<Arc<str>>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Attaches a firing number.
    #[inline]
    pub fn with_firing(mut self, n: u64) -> Self {
        self.firing = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_node(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_node(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
