//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: nodes (start, firings, terminal states), `Dataflow` groups,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the dataflow listener (fans out to `SubscriberSet`) and any
//!   receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
