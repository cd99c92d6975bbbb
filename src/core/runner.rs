//! # Run a single firing of a node's action.
//!
//! Invokes the action once with the given [`Firing`], isolates panics, and publishes
//! the per-firing event.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   action.run(firing) → Ok(())      → publish FiringCompleted
//!
//! Failure:
//!   action.run(firing) → Err(e)      → return Err(e)     (node publishes NodeFailed)
//!
//! Panic:
//!   action.run(firing) → unwind      → caught → Err(ActionError::Panicked)
//! ```
//!
//! ## Rules
//! - Never lets a panic escape into the executor.
//! - Publishes `FiringCompleted` only for successful firings; the terminal
//!   failure event is the node's responsibility.

use std::panic::{self, AssertUnwindSafe};

use super::firing::Firing;
use super::node::Core;
use crate::actions::Action;
use crate::error::ActionError;
use crate::events::{Event, EventKind};

/// Runs `action` once against `firing`.
pub(crate) fn run_firing<R: 'static>(
    core: &Core,
    action: &mut dyn Action<R>,
    firing: &mut Firing<'_, R>,
) -> Result<(), ActionError> {
    let number = firing.number();
    tracing::trace!(node = %core.name(), firing = number, "firing");

    let res = panic::catch_unwind(AssertUnwindSafe(|| action.run(firing)))
        .unwrap_or_else(|payload| {
            Err(ActionError::Panicked {
                info: panic_message(payload.as_ref()),
            })
        });

    if res.is_ok() {
        core.publish(|| {
            Event::new(EventKind::FiringCompleted)
                .with_node(core.name_arc())
                .with_firing(number)
        });
    }
    res
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
