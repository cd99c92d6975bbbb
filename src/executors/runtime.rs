//! # Tokio-backed executor.
//!
//! [`TokioExecutor`] hands jobs to the blocking pool of a tokio runtime.
//! Node actions are plain synchronous code, so they must not run on the async
//! worker threads directly.

use tokio::runtime::Handle;

use super::{Executor, Job};

/// Runs jobs on a tokio runtime's blocking pool.
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    /// Uses the given runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime of the calling context, if there is one.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, job: Job) {
        drop(self.handle.spawn_blocking(job));
    }

    fn name(&self) -> &'static str {
        "tokio"
    }
}
