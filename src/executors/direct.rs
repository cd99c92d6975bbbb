//! # Inline executor.
//!
//! [`DirectExecutor`] runs jobs on the calling thread. Jobs submitted while another
//! direct job is running on the same thread are queued and run after it returns,
//! so chains of firings (an actor re-arming itself, a node posting to another
//! direct node) do not grow the stack or re-enter a running node.
//!
//! ```text
//! execute(A) ──► run A
//!                 └─► execute(B) ──► queued
//!                 └─► execute(C) ──► queued
//!            ◄── A returns
//!            ──► run B ──► run C ──► drained, return
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;

use super::{Executor, Job};

thread_local! {
    /// `Some` while a direct job is running on this thread.
    static TRAMPOLINE: RefCell<Option<VecDeque<Job>>> = const { RefCell::new(None) };
}

/// Executes jobs on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectExecutor;

impl DirectExecutor {
    /// Construct a new [`DirectExecutor`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Executor for DirectExecutor {
    fn execute(&self, job: Job) {
        let first = TRAMPOLINE.with(move |cell| {
            let mut slot = cell.borrow_mut();
            match slot.as_mut() {
                Some(queue) => {
                    queue.push_back(job);
                    None
                }
                None => {
                    *slot = Some(VecDeque::new());
                    Some(job)
                }
            }
        });

        let Some(first) = first else {
            return;
        };

        let _reset = Reset;
        first();
        while let Some(next) = TRAMPOLINE.with(|cell| cell.borrow_mut().as_mut()?.pop_front()) {
            next();
        }
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// Clears the trampoline even if a job unwinds.
struct Reset;

impl Drop for Reset {
    fn drop(&mut self) {
        TRAMPOLINE.with(|cell| cell.borrow_mut().take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_runs_inline() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        DirectExecutor.execute(Box::new(move || s.lock().unwrap().push(1)));
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_nested_jobs_run_after_outer_job() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        DirectExecutor.execute(Box::new(move || {
            let inner = Arc::clone(&s);
            DirectExecutor.execute(Box::new(move || inner.lock().unwrap().push("inner")));
            s.lock().unwrap().push("outer");
        }));
        assert_eq!(*seen.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        fn chain(left: usize, count: Arc<Mutex<usize>>) {
            *count.lock().unwrap() += 1;
            if left > 0 {
                DirectExecutor.execute(Box::new(move || chain(left - 1, count)));
            }
        }
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        DirectExecutor.execute(Box::new(move || chain(100_000, c)));
        assert_eq!(*count.lock().unwrap(), 100_001);
    }

    #[test]
    fn test_trampoline_reset_after_panic() {
        let result = std::panic::catch_unwind(|| {
            DirectExecutor.execute(Box::new(|| panic!("boom")));
        });
        assert!(result.is_err());

        let seen = Arc::new(Mutex::new(false));
        let s = Arc::clone(&seen);
        DirectExecutor.execute(Box::new(move || *s.lock().unwrap() = true));
        assert!(*seen.lock().unwrap());
    }
}
