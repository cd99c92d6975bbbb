//! # pinflow
//!
//! **Pinflow** is a token-driven firing engine for Rust.
//!
//! A [`Node`] owns a fixed set of input pins. Producers post tokens to pins through
//! a [`Port`]; when every pin of a node holds what it needs, the node *fires*: its
//! [`Action`] runs once on an [`Executor`], consumes tokens through a [`Firing`],
//! and the node either re-arms (actors) or finishes with a result (one-shot tasks).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer threads / tasks
//!      │ post(token)      │ close()          │ release(n)
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Node                                                             │
//! │   pins:  [control] [Input] [ConstInput] [StreamInput] [Permits]   │
//! │   ReadinessMask: one bit per pin, bit set = pin blocked           │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                │ last bit cleared (exactly one caller)
//!                                ▼
//!                     Executor::execute(job)
//!                                │
//!                                ▼
//!             Action::run(&mut Firing) ──► purge ──► re-arm or finish
//!                                                        │
//!                  Promise<R> ◄──────────────────────────┤
//!                  Bus ◄── NodeStarted / FiringScheduled / NodeCompleted ...
//!                   │
//!                   ▼
//!           Dataflow listener ──► SubscriberSet ──► Subscribe::on_event
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ──start()──► Started ──fire──► run ──┬─ complete(v) ─► Stopped (result = v)
//!                         ▲                    ├─ stop()      ─► Stopped (result = Stopped)
//!                         │                    ├─ Err / panic ─► Stopped (result = Failed)
//!                         └──── re-arm ◄───────┴─ Ok, RestartPolicy::Always
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                               |
//! |-------------------|----------------------------------------------------------------|--------------------------------------------------|
//! | **Nodes**         | Build nodes, register pins, bind actions.                      | [`NodeBuilder`], [`Node`], [`Action`], [`TaskFn`] |
//! | **Pins**          | Typed inputs and the producer handle.                          | [`Input`], [`ConstInput`], [`StreamInput`], [`Permits`], [`Port`] |
//! | **Execution**     | Where firings run.                                             | [`Executor`], [`DirectExecutor`], [`ThreadExecutor`], [`TokioExecutor`] |
//! | **Results**       | Write-once result cells with blocking and async readers.       | [`Promise`]                                      |
//! | **Groups**        | Shared executor, bus and completion for many nodes.            | [`Dataflow`], [`Config`]                         |
//! | **Subscriber API**| Hook into node lifecycle events.                               | [`Subscribe`], [`Event`]                         |
//! | **Errors**        | Typed errors for pins, nodes, actions and results.             | [`PinError`], [`NodeError`], [`ActionError`], [`ResultError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::thread;
//! use pinflow::{DirectExecutor, NodeBuilder};
//!
//! let mut b = NodeBuilder::new("multiply").with_executor(DirectExecutor::new());
//! let a = b.input::<f64>().unwrap();
//! let x = b.input::<f64>().unwrap();
//! let node = b.task(move |f| Ok(f.take(a)? * f.take(x)?));
//! node.start();
//!
//! let pa = node.port(a);
//! let px = node.port(x);
//! let t1 = thread::spawn(move || pa.post(3.0).unwrap());
//! let t2 = thread::spawn(move || px.post(4.0).unwrap());
//! t1.join().unwrap();
//! t2.join().unwrap();
//!
//! assert_eq!(node.get(), Ok(12.0));
//! ```
mod actions;
mod core;
mod error;
mod events;
mod executors;
mod pins;
mod policies;
mod promise;
mod subscribers;

// ---- Public re-exports ----

pub use actions::{Action, ActionFn, TaskFn};
pub use crate::core::{
    Config, Dataflow, DataflowBuilder, Firing, Node, NodeBuilder, NodeState, ReadinessMask,
    MAX_PINS,
};
pub use error::{ActionError, NodeError, PinError, ResultError};
pub use events::{Bus, Event, EventKind};
pub use executors::{
    default_executor, DirectExecutor, Executor, ExecutorRef, Job, ManualExecutor, ThreadExecutor,
    TokioExecutor,
};
pub use pins::{ConstInput, Consume, Input, Permits, PinId, Port, StreamInput, StreamItem};
pub use policies::RestartPolicy;
pub use promise::Promise;
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
