//! Node restart policies.
//!
//! ## Contents
//! - [`RestartPolicy`] what a node does after a successful firing (stop / re-arm)
//!
//! ## Quick wiring
//! ```text
//! NodeBuilder::with_restart(RestartPolicy)
//!      └─► core::node uses it after each successful run():
//!           - Never  → stop, resolve the result
//!           - Always → purge pins, turn the control pin back on
//! ```
//!
//! ## Defaults
//! - `RestartPolicy::Never` (one-shot), overridable via [`Config::restart`](crate::Config).

mod restart;

pub use restart::RestartPolicy;
