//! Node actions: the [`Action`] trait and closure adapters.
//!
//! - [`Action`] explicit compute entry point, one call per firing
//! - [`ActionFn`] closure returning `()`, for actors
//! - [`TaskFn`] closure returning the node's value, for one-shot tasks

mod action;
mod action_fn;

pub use action::Action;
pub use action_fn::{ActionFn, TaskFn};
