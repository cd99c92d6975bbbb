//! # Closure-backed actions.
//!
//! - [`ActionFn`] wraps `FnMut(&mut Firing) -> Result<(), ActionError>`; the closure
//!   decides when (if ever) to complete the node.
//! - [`TaskFn`] wraps `FnMut(&mut Firing) -> Result<R, ActionError>` and completes
//!   the node with the returned value.
//!
//! ## Example
//! ```rust
//! use pinflow::{ActionFn, DirectExecutor, Firing, NodeBuilder, RestartPolicy};
//!
//! let mut b = NodeBuilder::new("echo")
//!     .with_executor(DirectExecutor::new())
//!     .with_restart(RestartPolicy::Always);
//! let x = b.input::<String>().unwrap();
//! let node = b.build(ActionFn::new(move |f: &mut Firing<'_, String>| {
//!     let s = f.take(x)?;
//!     if s == "bye" {
//!         f.complete(s);
//!     }
//!     Ok(())
//! }));
//!
//! node.start();
//! node.port(x).post("hi".into()).unwrap();
//! node.port(x).post("bye".into()).unwrap();
//! assert_eq!(node.get().as_deref(), Ok("bye"));
//! ```

use super::Action;
use crate::core::Firing;
use crate::error::ActionError;

/// Action backed by a closure that returns `()`.
pub struct ActionFn<F> {
    f: F,
}

impl<F> ActionFn<F> {
    /// Wraps `f`.
    pub fn new<R>(f: F) -> Self
    where
        F: FnMut(&mut Firing<'_, R>) -> Result<(), ActionError> + Send + 'static,
    {
        Self { f }
    }
}

impl<R, F> Action<R> for ActionFn<F>
where
    F: FnMut(&mut Firing<'_, R>) -> Result<(), ActionError> + Send + 'static,
{
    fn run(&mut self, firing: &mut Firing<'_, R>) -> Result<(), ActionError> {
        (self.f)(firing)
    }
}

/// Action backed by a closure whose value completes the node.
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Wraps `f`.
    pub fn new<R>(f: F) -> Self
    where
        F: FnMut(&mut Firing<'_, R>) -> Result<R, ActionError> + Send + 'static,
    {
        Self { f }
    }
}

impl<R, F> Action<R> for TaskFn<F>
where
    F: FnMut(&mut Firing<'_, R>) -> Result<R, ActionError> + Send + 'static,
{
    fn run(&mut self, firing: &mut Firing<'_, R>) -> Result<(), ActionError> {
        let value = (self.f)(firing)?;
        firing.complete(value);
        Ok(())
    }
}
