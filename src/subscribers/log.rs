//! # LogWriter: renders events through `tracing`.
//!
//! A minimal subscriber for demos and debugging. Install any `tracing` subscriber
//! (e.g. `tracing_subscriber::fmt`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO pinflow: [started] node=multiply
//! DEBUG pinflow: [scheduled] node=multiply firing=1
//! INFO pinflow: [completed] node=multiply firing=1
//! WARN pinflow: [failed] node=parser firing=3 reason="error: bad input"
//! INFO pinflow: [dataflow-completed]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let node = e.node.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::NodeStarted => tracing::info!("[started] node={node}"),
            EventKind::FiringScheduled => {
                tracing::debug!("[scheduled] node={node} firing={:?}", e.firing)
            }
            EventKind::FiringCompleted => {
                tracing::debug!("[fired] node={node} firing={:?}", e.firing)
            }
            EventKind::NodeCompleted => {
                tracing::info!("[completed] node={node} firing={:?}", e.firing)
            }
            EventKind::NodeStopped => tracing::info!("[stopped] node={node}"),
            EventKind::NodeFailed => tracing::warn!(
                "[failed] node={node} firing={:?} reason={:?}",
                e.firing,
                e.reason
            ),
            EventKind::DataflowCompleted => tracing::info!("[dataflow-completed]"),
            EventKind::DataflowFailed => {
                tracing::warn!("[dataflow-failed] node={node} reason={:?}", e.reason)
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!("[subscriber-overflow] {:?}", e.reason)
            }
            EventKind::SubscriberPanicked => {
                tracing::error!("[subscriber-panicked] subscriber={node} {:?}", e.reason)
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
