//! # Single-assignment result cells.
//!
//! A [`Promise`] is completed at most once, by the node that owns it, and read by any
//! number of waiters: blocking threads, async tasks, or callbacks.
//!
//! ```text
//!  node ──complete(v) / fail(e) / cancel()──► Promise ──► get()          (blocking)
//!                                               │      ──► wait().await   (async)
//!                                               └────► subscribe(cb)     (callback)
//! ```
//!
//! ## Rules
//! - The first resolution wins; later calls return `false` and change nothing.
//! - Callbacks registered after resolution run immediately on the calling thread.
//! - Callbacks run outside the internal lock, in registration order.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::error::{ActionError, ResultError};

type Callback<T> = Box<dyn FnOnce(&Result<T, ResultError>) + Send + 'static>;

enum State<T> {
    Pending(Vec<Callback<T>>),
    Done(Result<T, ResultError>),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
    done_tx: watch::Sender<bool>,
}

/// Write-once result shared between a producer and its readers.
///
/// Cloning is cheap and yields another handle to the same cell.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("done", &self.is_done())
            .finish()
    }
}

impl<T> Promise<T> {
    /// Returns `true` once resolved.
    pub fn is_done(&self) -> bool {
        matches!(*self.lock(), State::Done(_))
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Clone + Send + 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Creates an unresolved promise.
    pub fn new() -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Pending(Vec::new())),
                cond: Condvar::new(),
                done_tx,
            }),
        }
    }

    /// Resolves with a value.
    pub fn complete(&self, value: T) -> bool {
        self.resolve(Ok(value))
    }

    /// Resolves with a failure of the producing action.
    pub fn fail(&self, error: ActionError) -> bool {
        self.resolve(Err(ResultError::Failed(error)))
    }

    /// Resolves with [`ResultError::Stopped`].
    pub fn cancel(&self) -> bool {
        self.resolve(Err(ResultError::Stopped))
    }

    /// Returns the outcome if already resolved, without waiting.
    pub fn peek(&self) -> Option<Result<T, ResultError>> {
        match &*self.lock() {
            State::Done(outcome) => Some(outcome.clone()),
            State::Pending(_) => None,
        }
    }

    /// Blocks the calling thread until resolved.
    ///
    /// Do not call this from inside an async task; use [`wait`](Self::wait).
    pub fn get(&self) -> Result<T, ResultError> {
        let mut guard = self.lock();
        loop {
            if let State::Done(outcome) = &*guard {
                return outcome.clone();
            }
            guard = self
                .shared
                .cond
                .wait(guard)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Blocks for at most `timeout`.
    ///
    /// Returns [`ResultError::Timeout`] if the promise is still pending afterwards.
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, ResultError> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if let State::Done(outcome) = &*guard {
                return outcome.clone();
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Err(ResultError::Timeout { timeout });
            }
            guard = self
                .shared
                .cond
                .wait_timeout(guard, left)
                .map(|(g, _)| g)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    /// Waits asynchronously until resolved.
    pub async fn wait(&self) -> Result<T, ResultError> {
        let mut rx = self.shared.done_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|done| *done).await;
        self.peek().unwrap_or(Err(ResultError::Stopped))
    }

    /// Waits asynchronously for at most `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<T, ResultError> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ResultError::Timeout { timeout }),
        }
    }

    /// Registers a callback invoked with the outcome.
    ///
    /// Runs immediately if the promise is already resolved.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: FnOnce(&Result<T, ResultError>) + Send + 'static,
    {
        let mut guard = self.lock();
        match &mut *guard {
            State::Pending(callbacks) => callbacks.push(Box::new(callback)),
            State::Done(outcome) => {
                let outcome = outcome.clone();
                drop(guard);
                callback(&outcome);
            }
        }
    }

    fn resolve(&self, outcome: Result<T, ResultError>) -> bool {
        let callbacks = {
            let mut guard = self.lock();
            if matches!(*guard, State::Done(_)) {
                return false;
            }
            match std::mem::replace(&mut *guard, State::Done(outcome.clone())) {
                State::Pending(callbacks) => callbacks,
                State::Done(_) => Vec::new(),
            }
        };

        self.shared.cond.notify_all();
        self.shared.done_tx.send_replace(true);
        for callback in callbacks {
            callback(&outcome);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_first_resolution_wins() {
        let p = Promise::new();
        assert!(p.complete(1));
        assert!(!p.complete(2));
        assert!(!p.fail(ActionError::fail("late")));
        assert!(!p.cancel());
        assert_eq!(p.get(), Ok(1));
    }

    #[test]
    fn test_debug_reports_state() {
        let p: Promise<u8> = Promise::new();
        assert_eq!(format!("{p:?}"), "Promise { done: false }");
        p.complete(1);
        assert_eq!(format!("{p:?}"), "Promise { done: true }");
    }

    #[test]
    fn test_peek_pending_and_done() {
        let p: Promise<u8> = Promise::new();
        assert_eq!(p.peek(), None);
        assert!(!p.is_done());
        p.cancel();
        assert_eq!(p.peek(), Some(Err(ResultError::Stopped)));
        assert!(p.is_done());
    }

    #[test]
    fn test_get_blocks_until_completed_from_other_thread() {
        let p = Promise::new();
        let writer = p.clone();
        let h = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.complete("done".to_string());
        });
        assert_eq!(p.get().as_deref(), Ok("done"));
        h.join().unwrap();
    }

    #[test]
    fn test_get_timeout_expires() {
        let p: Promise<()> = Promise::new();
        let timeout = Duration::from_millis(10);
        assert_eq!(p.get_timeout(timeout), Err(ResultError::Timeout { timeout }));
    }

    #[test]
    fn test_fail_is_visible_to_readers() {
        let p: Promise<u32> = Promise::new();
        p.fail(ActionError::fail("boom"));
        assert_eq!(
            p.get(),
            Err(ResultError::Failed(ActionError::fail("boom")))
        );
    }

    #[test]
    fn test_callbacks_run_once_in_order() {
        let p = Promise::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            p.subscribe(move |r: &Result<i32, ResultError>| {
                order.lock().unwrap().push((i, r.clone()));
            });
        }
        p.complete(7);
        p.complete(8);
        assert_eq!(*order.lock().unwrap(), vec![(0, Ok(7)), (1, Ok(7)), (2, Ok(7))]);
    }

    #[test]
    fn test_late_callback_runs_immediately() {
        let p = Promise::new();
        p.complete(5u8);
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        p.subscribe(move |r| {
            assert_eq!(*r, Ok(5));
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_wait() {
        let p = Promise::new();
        let writer = p.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.complete(3.5f64);
        });
        assert_eq!(p.wait().await, Ok(3.5));
    }

    #[tokio::test]
    async fn test_async_wait_timeout() {
        let p: Promise<()> = Promise::new();
        let timeout = Duration::from_millis(5);
        assert_eq!(
            p.wait_timeout(timeout).await,
            Err(ResultError::Timeout { timeout })
        );
    }
}
