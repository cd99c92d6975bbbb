//! # Executor boundary.
//!
//! The only thing a node needs from its environment: something that accepts a
//! zero-argument job and runs it, now or later, on this thread or another.
//!
//! The core never spawns threads on its own; it hands every firing to the node's
//! executor. Executors are injected ([`NodeBuilder::with_executor`](crate::NodeBuilder::with_executor),
//! [`Dataflow`](crate::Dataflow)), never looked up from global state.

use std::sync::Arc;

use tokio::runtime::Handle;

use super::{ThreadExecutor, TokioExecutor};

/// A unit of work submitted to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to an executor.
pub type ExecutorRef = Arc<dyn Executor>;

/// # Runs jobs submitted by firing nodes.
///
/// Implementations may run the job inline or hand it to worker threads.
/// No ordering is guaranteed between jobs of different nodes; a single node's
/// firings are serialized by the node itself.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use pinflow::{Executor, Job};
///
/// struct Counting(AtomicUsize);
///
/// impl Executor for Counting {
///     fn execute(&self, job: Job) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///         job();
///     }
/// }
///
/// let exec = Counting(AtomicUsize::new(0));
/// exec.execute(Box::new(|| {}));
/// assert_eq!(exec.0.load(Ordering::Relaxed), 1);
/// ```
pub trait Executor: Send + Sync + 'static {
    /// Runs `job`, possibly asynchronously.
    fn execute(&self, job: Job);

    /// Returns a short name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Picks an executor for nodes that were not given one.
///
/// - inside a tokio runtime → [`TokioExecutor`] on the current handle;
/// - otherwise → [`ThreadExecutor`] (one thread per firing).
pub fn default_executor() -> ExecutorRef {
    match Handle::try_current() {
        Ok(handle) => Arc::new(TokioExecutor::new(handle)),
        Err(_) => Arc::new(ThreadExecutor::default()),
    }
}
