//! # Dataflow configuration.
//!
//! Provides [`Config`], the settings a [`Dataflow`](crate::Dataflow) hands to every
//! node built through it.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 (see [`Config::bus_capacity_clamped`])

use crate::policies::RestartPolicy;

/// Settings shared by the nodes of one dataflow.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
/// - `stop_on_failure`: stop every other member once one node fails
/// - `restart`: restart policy for nodes built without an explicit one
///
/// Executors are not configured here; they are injected.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging behind more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,

    /// Stop the remaining nodes when any node of the dataflow fails.
    pub stop_on_failure: bool,

    /// Default restart policy for nodes built through the dataflow.
    ///
    /// `NodeBuilder::task` and `NodeBuilder::actor` override it.
    pub restart: RestartPolicy,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `stop_on_failure = true`
    /// - `restart = RestartPolicy::Never` (one-shot)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            stop_on_failure: true,
            restart: RestartPolicy::default(),
        }
    }
}
