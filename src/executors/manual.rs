//! # Manually drained executor.
//!
//! [`ManualExecutor`] only queues jobs; nothing runs until the owner calls
//! [`run_one`](ManualExecutor::run_one) or [`run_all`](ManualExecutor::run_all).
//! Handy for stepping through firings deterministically in tests and while debugging.
//!
//! ```text
//! node.with_executor(manual.clone())
//! node.start()          ─► job queued
//! port.post(token)      ─► job queued
//! manual.run_all()      ─► jobs run on this thread, including ones they enqueue
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{Executor, Job};

/// Queue of jobs executed on demand.
#[derive(Default)]
pub struct ManualExecutor {
    queue: Mutex<VecDeque<Job>>,
}

impl ManualExecutor {
    /// Creates an empty executor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the oldest queued job. Returns `false` if the queue was empty.
    pub fn run_one(&self) -> bool {
        let job = self.lock().pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs jobs until the queue is empty, including jobs enqueued meanwhile.
    ///
    /// Returns the number of jobs run.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }

    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Job>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, job: Job) {
        self.lock().push_back(job);
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}
