//! # Thread-per-job executor.
//!
//! [`ThreadExecutor`] spawns a named OS thread for every job. It needs no runtime,
//! which makes it the fallback of [`default_executor`](super::default_executor).
//!
//! If the OS refuses a new thread, the job runs inline on the submitting thread so
//! the node that claimed its control bit still runs.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;

use super::{Executor, Job};

/// Runs each job on a freshly spawned thread.
#[derive(Clone, Debug)]
pub struct ThreadExecutor {
    name: String,
}

impl ThreadExecutor {
    /// Creates an executor whose threads are named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadExecutor {
    /// Threads are named `pinflow-worker`.
    fn default() -> Self {
        Self::new("pinflow-worker")
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, job: Job) {
        let builder = thread::Builder::new().name(self.name.clone());
        dispatch(&self.name, job, |wrapped| builder.spawn(wrapped).map(drop));
    }

    fn name(&self) -> &'static str {
        "thread"
    }
}

/// Hands `job` to `spawn`; runs it inline if `spawn` fails.
///
/// `spawn` consumes its closure even on failure, so the job is kept in a shared slot
/// that whichever side gets to it first empties.
fn dispatch<S>(name: &str, job: Job, spawn: S)
where
    S: FnOnce(Job) -> io::Result<()>,
{
    let slot = Arc::new(Mutex::new(Some(job)));
    let remote = Arc::clone(&slot);
    let wrapped: Job = Box::new(move || {
        if let Some(job) = take(&remote) {
            job();
        }
    });

    if let Err(e) = spawn(wrapped) {
        tracing::warn!(executor = %name, error = %e, "spawn failed, running job inline");
        if let Some(job) = take(&slot) {
            job();
        }
    }
}

fn take(slot: &Mutex<Option<Job>>) -> Option<Job> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_runs_on_named_thread() {
        let (tx, rx) = mpsc::channel();
        ThreadExecutor::new("pin-test").execute(Box::new(move || {
            let name = thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        }));
        assert_eq!(rx.recv().unwrap().as_deref(), Some("pin-test"));
    }

    #[test]
    fn test_failed_spawn_runs_inline() {
        let (tx, rx) = mpsc::channel();
        let caller = thread::current().id();
        dispatch(
            "broken",
            Box::new(move || tx.send(thread::current().id()).unwrap()),
            |_wrapped| Err(io::Error::new(io::ErrorKind::Other, "no threads left")),
        );
        assert_eq!(rx.try_recv().unwrap(), caller);
    }

    #[test]
    fn test_job_runs_once_when_spawned() {
        let (tx, rx) = mpsc::channel();
        dispatch("ok", Box::new(move || tx.send(()).unwrap()), |wrapped| {
            wrapped();
            Ok(())
        });
        assert_eq!(rx.try_iter().count(), 1);
    }
}
