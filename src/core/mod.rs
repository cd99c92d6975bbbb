//! Runtime core: readiness tracking, node lifecycle and grouping.
//!
//! Internal modules:
//! - [`mask`]: atomic readiness bit set, one bit per pin;
//! - [`node`]: node state machine, fire/run/purge/re-arm;
//! - [`builder`]: pin registration and action binding;
//! - [`firing`]: the action's view of one firing;
//! - [`runner`]: runs one firing with panic isolation;
//! - [`dataflow`]: groups of nodes with a shared executor, bus and result;
//! - [`config`]: dataflow settings.
//!
//! ## Wiring
//! ```text
//! Port::post ──► pin slot ──► ReadinessMask ──edge──► Node::fire ──► Executor
//!                                                                      │
//!      ┌───────────────────────────────────────────────────────────────┘
//!      ▼
//!  Node::run ──► runner::run_firing(Action, Firing) ──► purge ──► re-arm / finish
//!                                                                     │
//!                                   Promise ◄── finish ──► Bus ──► Group::leave
//! ```

mod builder;
mod config;
mod dataflow;
mod firing;
mod mask;
mod node;
mod runner;

pub use builder::NodeBuilder;
pub use config::Config;
pub use dataflow::{Dataflow, DataflowBuilder};
pub use firing::Firing;
pub use mask::{ReadinessMask, MAX_PINS};
pub use node::{Node, NodeState};

pub(crate) use node::Trigger;
pub(crate) use runner::panic_message;
