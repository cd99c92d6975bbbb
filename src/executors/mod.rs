//! # Executors that run node firings.
//!
//! This module provides the [`Executor`] boundary and the built-in implementations:
//! - [`DirectExecutor`] - inline, with a per-thread trampoline
//! - [`ThreadExecutor`] - one OS thread per job
//! - [`TokioExecutor`] - a tokio runtime's blocking pool
//! - [`ManualExecutor`] - queued until drained explicitly
//! - [`default_executor`] - tokio inside a runtime, threads otherwise

mod direct;
mod executor;
mod manual;
mod runtime;
mod thread;

pub use direct::DirectExecutor;
pub use executor::{default_executor, Executor, ExecutorRef, Job};
pub use manual::ManualExecutor;
pub use runtime::TokioExecutor;
pub use thread::ThreadExecutor;
