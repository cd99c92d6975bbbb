//! # Fan-out of events to subscribers.
//!
//! [`SubscriberSet`] gives each subscriber a bounded lane and a tokio task that drains
//! it, so a slow or broken subscriber never holds up node execution.
//!
//! ```text
//! emit(ev) ──try_send──► lane "log"     ──► task ──► LogWriter::on_event
//!          ──try_send──► lane "metrics" ──► task ──► Metrics::on_event
//!                         full / closed ──► Bus: SubscriberOverflow
//!                                  panic ──► Bus: SubscriberPanicked
//! ```
//!
//! ## Rules
//! - `emit` never waits.
//! - Lanes are independent; there is no ordering between two subscribers.
//! - An overflow event that itself overflows is dropped silently.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Set of subscriber lanes fed from one bus.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    tasks: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one draining task per subscriber. Needs a tokio runtime.
    ///
    /// Panics and overflows are reported on `bus`.
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (lanes, tasks) = subscribers
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let lane = Lane {
                    name: sub.name(),
                    tx,
                };
                (lane, tokio::spawn(drain(sub, rx, bus.clone())))
            })
            .unzip();
        Self { lanes, tasks, bus }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// True without subscribers.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Hands a copy of `event` to every lane.
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Hands a shared event to every lane.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let overflow = event.kind == EventKind::SubscriberOverflow;
        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !overflow {
                self.bus.publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Closes the lanes and waits until every task drained what was queued.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev))
            .catch_unwind()
            .await;
        if let Err(payload) = handled {
            bus.publish(Event::subscriber_panicked(
                sub.name(),
                panic_message(payload.as_ref()),
            ));
        }
    }
}
