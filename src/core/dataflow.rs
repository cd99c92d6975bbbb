//! # Dataflow: a group of nodes sharing an executor, a bus and a fate.
//!
//! The [`Dataflow`] hands its executor, bus and default restart policy to every node
//! built through [`Dataflow::node`], tracks the members, and owns a `Promise<()>`
//! that resolves when the group is done.
//!
//! ## Architecture
//! ```text
//! DataflowBuilder::new(cfg)
//!   ├─► with_subscribers(subs)      optional, needs a tokio runtime
//!   ├─► with_executor(exec)         default: default_executor()
//!   └─► build() ──► Dataflow { bus, executor, group }
//!
//! dataflow.node("a") ──► NodeBuilder (executor, bus, restart, group preset)
//!
//! node finishes ──► Group::leave
//!   ├─ failed          → result.fail, DataflowFailed, stop members (stop_on_failure)
//!   └─ last counted    → result.complete, DataflowCompleted
//!
//! Event flow:
//!   Node ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//! ```
//!
//! ## Rules
//! - Daemon nodes are members (they are stopped with the group) but are not counted.
//! - The group completes when the count of live counted members drops to zero, so
//!   build every counted node before starting any of them.
//! - The first failure wins; later failures only stop nodes.
//! - The subscriber listener lives as long as the group: once the dataflow and all of
//!   its nodes are dropped, the listener ends and the subscriber lanes drain and close.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::builder::NodeBuilder;
use super::config::Config;
use crate::error::{ActionError, NodeError, ResultError};
use crate::events::{Bus, Event, EventKind};
use crate::executors::{default_executor, Executor, ExecutorRef};
use crate::promise::Promise;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Members a group can stop without knowing their result type.
pub(crate) trait Stoppable: Send + Sync {
    fn stop(&self) -> bool;
    fn is_stopped(&self) -> bool;
}

struct Member {
    name: Arc<str>,
    node: Weak<dyn Stoppable>,
}

struct GroupState {
    members: Vec<Member>,
    live: usize,
    entered: usize,
}

/// Shared bookkeeping of one dataflow.
pub(crate) struct Group {
    state: Mutex<GroupState>,
    result: Promise<()>,
    stop_on_failure: bool,
    bus: Bus,
    /// Cancels the subscriber listener when the group goes away.
    _listener: Option<DropGuard>,
}

impl Group {
    fn new(stop_on_failure: bool, bus: Bus, listener: Option<DropGuard>) -> Self {
        Self {
            state: Mutex::new(GroupState {
                members: Vec::new(),
                live: 0,
                entered: 0,
            }),
            result: Promise::new(),
            stop_on_failure,
            bus,
            _listener: listener,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn enter(&self, name: &str, node: Weak<dyn Stoppable>, counted: bool) {
        let mut st = self.lock();
        st.members.retain(|m| m.node.strong_count() > 0);
        st.members.push(Member {
            name: Arc::from(name),
            node,
        });
        if counted {
            st.live += 1;
            st.entered += 1;
        }
    }

    pub(crate) fn leave(&self, name: &str, counted: bool, failure: Option<&ActionError>) {
        if let Some(err) = failure {
            if self.result.fail(err.clone()) {
                tracing::warn!(node = %name, error = %err, "dataflow failed");
                self.bus.publish(
                    Event::new(EventKind::DataflowFailed)
                        .with_node(name)
                        .with_reason(err.as_message()),
                );
            }
            if self.stop_on_failure {
                self.stop_all();
            }
        }

        if counted {
            let left = {
                let mut st = self.lock();
                st.live = st.live.saturating_sub(1);
                st.live
            };
            if left == 0 && self.result.complete(()) {
                tracing::debug!("dataflow completed");
                self.bus.publish(Event::new(EventKind::DataflowCompleted));
            }
        }
    }

    /// Stops every member still alive. Returns how many changed state.
    fn stop_all(&self) -> usize {
        // Collect first: stopping a node may re-enter `leave`.
        let nodes: Vec<_> = self
            .lock()
            .members
            .iter()
            .filter_map(|m| m.node.upgrade())
            .collect();
        nodes.into_iter().filter(|n| n.stop()).count()
    }

    fn live_names(&self) -> Vec<String> {
        let st = self.lock();
        let mut names: Vec<String> = st
            .members
            .iter()
            .filter(|m| m.node.upgrade().is_some_and(|n| !n.is_stopped()))
            .map(|m| m.name.to_string())
            .collect();
        names.sort_unstable();
        names
    }

    fn is_empty(&self) -> bool {
        self.lock().entered == 0
    }

    #[cfg(test)]
    fn member_count(&self) -> usize {
        self.lock().members.len()
    }
}

/// # A group of nodes with a shared executor, bus and result.
///
/// # Example
/// ```
/// use pinflow::{Config, Dataflow, DirectExecutor};
///
/// let df = Dataflow::builder(Config::default())
///     .with_executor(DirectExecutor::new())
///     .build()
///     .unwrap();
///
/// let mut b = df.node("double");
/// let x = b.input::<u32>().unwrap();
/// let node = b.task(move |f| Ok(f.take(x)? * 2));
///
/// node.start();
/// node.port(x).post(21).unwrap();
/// assert_eq!(node.get(), Ok(42));
/// assert_eq!(df.blocking_join(), Ok(()));
/// ```
pub struct Dataflow {
    cfg: Config,
    bus: Bus,
    executor: ExecutorRef,
    group: Arc<Group>,
}

impl Dataflow {
    /// Creates a dataflow with the default executor and no subscribers.
    pub fn new(cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self::assemble(cfg, bus, default_executor(), None)
    }

    /// Starts a [`DataflowBuilder`].
    pub fn builder(cfg: Config) -> DataflowBuilder {
        DataflowBuilder::new(cfg)
    }

    fn assemble(
        cfg: Config,
        bus: Bus,
        executor: ExecutorRef,
        listener: Option<DropGuard>,
    ) -> Self {
        let group = Arc::new(Group::new(cfg.stop_on_failure, bus.clone(), listener));
        Self {
            cfg,
            bus,
            executor,
            group,
        }
    }

    /// Starts building a member node.
    pub fn node(&self, name: impl Into<Arc<str>>) -> NodeBuilder {
        let mut builder = NodeBuilder::new(name)
            .with_bus(self.bus.clone())
            .in_group(Arc::clone(&self.group));
        builder.set_executor_ref(Arc::clone(&self.executor));
        builder.set_restart(self.cfg.restart);
        builder
    }

    /// Bus carrying the events of every member.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Configuration the dataflow was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The group's result cell.
    pub fn result(&self) -> Promise<()> {
        self.group.result.clone()
    }

    /// Sorted names of members that have not stopped.
    pub fn live_nodes(&self) -> Vec<String> {
        self.group.live_names()
    }

    /// Stops every member. Returns how many were still running.
    pub fn stop(&self) -> usize {
        self.group.stop_all()
    }

    /// Waits asynchronously until every counted node finished or one failed.
    ///
    /// Returns immediately for a dataflow without counted nodes.
    pub async fn join(&self) -> Result<(), ResultError> {
        if self.group.is_empty() {
            return Ok(());
        }
        self.group.result.wait().await
    }

    /// Blocking variant of [`join`](Self::join).
    pub fn blocking_join(&self) -> Result<(), ResultError> {
        if self.group.is_empty() {
            return Ok(());
        }
        self.group.result.get()
    }

    /// Blocking join giving up after `timeout`.
    pub fn join_timeout(&self, timeout: Duration) -> Result<(), ResultError> {
        if self.group.is_empty() {
            return Ok(());
        }
        self.group.result.get_timeout(timeout)
    }
}

impl std::fmt::Debug for Dataflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataflow")
            .field("executor", &self.executor.name())
            .field("done", &self.group.result.is_done())
            .finish()
    }
}

/// Builder for a [`Dataflow`] with optional subscribers.
pub struct DataflowBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    executor: Option<ExecutorRef>,
}

impl DataflowBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            executor: None,
        }
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Executor handed to every member node.
    pub fn with_executor<E: Executor>(mut self, executor: E) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Builds the dataflow.
    ///
    /// # Errors
    /// [`NodeError::NoRuntime`] if subscribers were given outside a tokio runtime.
    pub fn build(self) -> Result<Dataflow, NodeError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let mut listener = None;
        if !self.subscribers.is_empty() {
            tokio::runtime::Handle::try_current()
                .map_err(|_| NodeError::NoRuntime { what: "subscribers" })?;
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            let token = CancellationToken::new();
            subscriber_listener(&bus, set, token.clone());
            listener = Some(token.drop_guard());
        }
        let executor = self.executor.unwrap_or_else(default_executor);
        Ok(Dataflow::assemble(self.cfg, bus, executor, listener))
    }
}

/// Subscribes to the bus and forwards events to the subscriber set.
///
/// Runs until `token` is cancelled, then drops the set so its lanes drain and close.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        // Forward what was already published before the group went away.
        while let Ok(ev) = rx.try_recv() {
            set.emit(&ev);
        }
        tracing::debug!(subscribers = set.len(), "subscriber listener stopped");
    });
}
