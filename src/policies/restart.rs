//! # Restart policies for nodes.
//!
//! [`RestartPolicy`] decides what a node does after a **successful** firing.
//!
//! - [`RestartPolicy::Never`] one-shot task: the node fires once and stops.
//! - [`RestartPolicy::Always`] actor: the node purges its pins and re-arms, firing again
//!   as soon as every pin is ready.
//!
//! A failed firing never restarts, whatever the policy.
//!
//! ## Choosing the right policy
//!
//! **Scalar computations** (all inputs arrive once, one result):
//! ```text
//! RestartPolicy::Never          → fire once, complete the result, stop
//! ```
//!
//! **Stream processing** (tokens keep arriving):
//! ```text
//! RestartPolicy::Always         → fire, purge, re-arm; until stop() or complete()
//! ```

/// Policy controlling whether a node re-arms after a successful firing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Fire once and stop (one-shot task).
    #[default]
    Never,
    /// Re-arm after every successful firing (actor).
    Always,
}

impl RestartPolicy {
    /// True if the node re-arms after a successful firing.
    #[inline]
    pub fn rearms(&self) -> bool {
        matches!(self, RestartPolicy::Always)
    }
}
