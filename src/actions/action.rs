//! # The compute entry point of a node.
//!
//! An [`Action`] is invoked once per firing with a [`Firing`] that exposes the
//! tokens of the node's pins. It is plain synchronous code: the executor decides
//! which thread runs it.

use crate::core::Firing;
use crate::error::ActionError;

/// # User logic of a node.
///
/// `run` is never called concurrently for one node, so the action may keep
/// mutable state in `self` without locking.
///
/// Returning `Err` (or panicking) stops the node for good and fails its result.
///
/// # Example
/// ```
/// use pinflow::{Action, ActionError, DirectExecutor, Firing, NodeBuilder, StreamInput, StreamItem};
///
/// struct Sum {
///     input: StreamInput<u64>,
///     total: u64,
/// }
///
/// impl Action<u64> for Sum {
///     fn run(&mut self, f: &mut Firing<'_, u64>) -> Result<(), ActionError> {
///         match f.take(self.input)? {
///             StreamItem::Token(n) => self.total += n,
///             StreamItem::End => f.complete(self.total),
///         }
///         Ok(())
///     }
/// }
///
/// let mut b = NodeBuilder::new("sum").with_executor(DirectExecutor::new());
/// let input = b.stream_input::<u64>().unwrap();
/// let node = b.actor_with(Sum { input, total: 0 });
///
/// node.start();
/// let port = node.port(input);
/// for n in 1..=4 {
///     port.post(n).unwrap();
/// }
/// port.close().unwrap();
/// assert_eq!(node.get(), Ok(10));
/// ```
pub trait Action<R>: Send + 'static {
    /// Runs one firing.
    fn run(&mut self, firing: &mut Firing<'_, R>) -> Result<(), ActionError>;
}
