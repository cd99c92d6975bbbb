//! # Node: a unit of computation fired by its pins.
//!
//! A [`Node`] owns a readiness mask and an arena of pins. When the last blocked pin
//! becomes ready, the producer that observed the edge submits the node to its
//! executor; the executor runs the action once, the pins are purged, and the
//! restart policy decides whether the node re-arms.
//!
//! ## State machine
//! ```text
//!   Created ──start()──► Started ──┬──► (Firing ──► Idle)* ──┐
//!      │                           │                          ├──► Stopped
//!      └──────────stop()───────────┴──── stop() / failure ────┘
//! ```
//!
//! ## Firing loop
//! ```text
//! producer: post ─► slot ─► mask.turn_on_exclusive(bit) ─► edge? ─► fire()
//!                                     (control bit re-blocked atomically)
//! fire():   executor.execute(run)
//! run():    lock action
//!           ├─ stopped?                  → finish(Stopped)
//!           ├─ Firing::open              (tokens presented)
//!           ├─ runner::run_firing
//!           │    ├─ Err / panic          → Stopped, finish(Failed), no purge
//!           │    └─ Ok                   → purge pins
//!           ├─ completed?                → finish(Completed)
//!           ├─ stop() / one-shot         → finish(Stopped)
//!           └─ actor                     → unlock, mask.turn_on_exclusive(CONTROL) → edge? → fire()
//! ```
//!
//! ## Rules
//! - At most one run of a node is scheduled or in flight at any time: the control
//!   bit is blocked from the moment an edge is observed until the run re-arms.
//! - A failing firing stops the node for good. There is no automatic retry.
//! - `stop()` is not preemptive: an in-flight run completes, nothing fires after it.
//! - The terminal transition happens exactly once; it resolves the node's promise
//!   and publishes one of `NodeCompleted`, `NodeStopped`, `NodeFailed`.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError, Weak};
use std::time::Duration;

use super::dataflow::{Group, Stoppable};
use super::firing::Firing;
use super::mask::{ReadinessMask, CONTROL_BIT};
use super::runner;
use crate::actions::Action;
use crate::error::{ActionError, NodeError, PinError, ResultError};
use crate::events::{Bus, Event, EventKind};
use crate::executors::{Executor, ExecutorRef};
use crate::pins::{PinId, PinSlot, Port};
use crate::policies::RestartPolicy;
use crate::promise::Promise;

/// Lifecycle state of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Built, pins registered, control pin blocked.
    Created,
    /// Started; fires whenever all pins are ready.
    Started,
    /// Terminal; never fires again.
    Stopped,
}

impl NodeState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => NodeState::Created,
            1 => NodeState::Started,
            _ => NodeState::Stopped,
        }
    }

    /// Returns a short stable label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeState::Created => "created",
            NodeState::Started => "started",
            NodeState::Stopped => "stopped",
        }
    }
}

/// Type-erased part of a node: everything producers and firings touch.
pub(crate) struct Core {
    id: u64,
    name: Arc<str>,
    mask: ReadinessMask,
    slots: Vec<Box<dyn PinSlot>>,
    state: AtomicU8,
    started: AtomicBool,
    firings: AtomicU64,
    executor: RwLock<ExecutorRef>,
    bus: Option<Bus>,
}

impl Core {
    pub(crate) fn new(
        id: u64,
        name: Arc<str>,
        mask: ReadinessMask,
        slots: Vec<Box<dyn PinSlot>>,
        executor: ExecutorRef,
        bus: Option<Bus>,
    ) -> Self {
        Self {
            id,
            name,
            mask,
            slots,
            state: AtomicU8::new(NodeState::Created as u8),
            started: AtomicBool::new(false),
            firings: AtomicU64::new(0),
            executor: RwLock::new(executor),
            bus,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub(crate) fn mask(&self) -> &ReadinessMask {
        &self.mask
    }

    pub(crate) fn slots(&self) -> &[Box<dyn PinSlot>] {
        &self.slots
    }

    /// Arena index of a pin owned by this node.
    pub(crate) fn index(&self, id: PinId) -> Result<usize, PinError> {
        let i = id.bit as usize;
        if id.node != self.id || i >= self.slots.len() {
            return Err(PinError::ForeignPin);
        }
        Ok(i)
    }

    /// Typed slot of a pin owned by this node.
    pub(crate) fn slot<S: 'static>(&self, id: PinId) -> Result<&S, PinError> {
        let i = self.index(id)?;
        self.slots[i]
            .as_any()
            .downcast_ref::<S>()
            .ok_or(PinError::ForeignPin)
    }

    pub(crate) fn state(&self) -> NodeState {
        NodeState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.state() == NodeState::Stopped
    }

    /// Moves to `Stopped`. Returns `false` if already stopped.
    fn set_stopped(&self) -> bool {
        let prev = self.state.swap(NodeState::Stopped as u8, Ordering::SeqCst);
        self.mask.turn_off(CONTROL_BIT);
        prev != NodeState::Stopped as u8
    }

    fn executor(&self) -> ExecutorRef {
        Arc::clone(&self.executor.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Publishes the event built by `ev` if the node has a bus.
    pub(crate) fn publish(&self, ev: impl FnOnce() -> Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev());
        }
    }
}

/// Something a producer can fire after observing a readiness edge.
pub(crate) trait Trigger: Send + Sync + 'static {
    fn core(&self) -> &Core;

    /// Submits one run to the node's executor.
    fn fire(self: Arc<Self>);
}

/// How a node ended.
enum Exit<R> {
    Completed(R, u64),
    Stopped,
    Failed(ActionError, u64),
}

/// Membership of a node in a dataflow group.
pub(crate) struct Membership {
    pub(crate) group: Arc<Group>,
    pub(crate) counted: bool,
}

type BoxAction<R> = Box<dyn Action<R>>;

pub(crate) struct NodeInner<R> {
    core: Core,
    action: Mutex<Option<BoxAction<R>>>,
    restart: RestartPolicy,
    result: Promise<R>,
    membership: Option<Membership>,
}

impl<R: Clone + Send + 'static> NodeInner<R> {
    pub(crate) fn new(
        core: Core,
        action: BoxAction<R>,
        restart: RestartPolicy,
        membership: Option<Membership>,
    ) -> Self {
        Self {
            core,
            action: Mutex::new(Some(action)),
            restart,
            result: Promise::new(),
            membership,
        }
    }

    fn lock_action(&self) -> MutexGuard<'_, Option<BoxAction<R>>> {
        self.action.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn start(self: &Arc<Self>) -> bool {
        let swapped = self.core.state.compare_exchange(
            NodeState::Created as u8,
            NodeState::Started as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if swapped.is_err() {
            return false;
        }
        self.core.started.store(true, Ordering::SeqCst);

        tracing::debug!(node = %self.core.name, executor = self.core.executor().name(), "node started");
        self.core
            .publish(|| Event::new(EventKind::NodeStarted).with_node(self.core.name_arc()));

        if self.core.mask.turn_on_exclusive(CONTROL_BIT) {
            Arc::clone(self).fire();
        }
        true
    }

    fn run(self: Arc<Self>) {
        let mut guard = self.lock_action();
        let Some(action) = guard.as_mut() else {
            return;
        };
        if self.core.is_stopped() {
            guard.take();
            drop(guard);
            self.finish(Exit::Stopped);
            return;
        }

        let number = self.core.firings.fetch_add(1, Ordering::AcqRel) + 1;
        let mut firing = Firing::open(&self.core, number);

        let outcome = runner::run_firing(&self.core, action.as_mut(), &mut firing);
        match outcome {
            Err(err) => {
                drop(firing);
                self.core.set_stopped();
                guard.take();
                drop(guard);
                self.finish(Exit::Failed(err, number));
            }
            Ok(()) => {
                let disposition = firing.purge();
                if let Some(value) = disposition.completion {
                    self.core.set_stopped();
                    guard.take();
                    drop(guard);
                    self.finish(Exit::Completed(value, number));
                } else if disposition.stop || !self.restart.rearms() || self.core.is_stopped() {
                    self.core.set_stopped();
                    guard.take();
                    drop(guard);
                    self.finish(Exit::Stopped);
                } else {
                    drop(guard);
                    self.rearm();
                }
            }
        }
    }

    /// Releases the control bit after a successful actor firing.
    fn rearm(self: Arc<Self>) {
        if self.core.is_stopped() {
            self.try_finalize();
        } else if self.core.mask.turn_on_exclusive(CONTROL_BIT) {
            self.fire();
        }
    }

    fn stop(&self) -> bool {
        let changed = self.core.set_stopped();
        self.try_finalize();
        changed
    }

    /// Finishes the node unless a run holds the action; that run finishes it instead.
    fn try_finalize(&self) {
        let mut guard = match self.action.try_lock() {
            Ok(g) => g,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        if guard.take().is_some() {
            drop(guard);
            self.finish(Exit::Stopped);
        }
    }

    /// Terminal transition. Runs once per node: callers take the action first.
    fn finish(&self, exit: Exit<R>) {
        let name = self.core.name_arc();
        let failure = match exit {
            Exit::Completed(value, number) => {
                tracing::debug!(node = %name, firing = number, "node completed");
                self.result.complete(value);
                self.core.publish(|| {
                    Event::new(EventKind::NodeCompleted)
                        .with_node(Arc::clone(&name))
                        .with_firing(number)
                });
                None
            }
            Exit::Stopped => {
                tracing::debug!(node = %name, "node stopped");
                self.result.cancel();
                self.core
                    .publish(|| Event::new(EventKind::NodeStopped).with_node(Arc::clone(&name)));
                None
            }
            Exit::Failed(err, number) => {
                tracing::warn!(node = %name, firing = number, error = %err, "node failed");
                self.result.fail(err.clone());
                self.core.publish(|| {
                    Event::new(EventKind::NodeFailed)
                        .with_node(Arc::clone(&name))
                        .with_firing(number)
                        .with_reason(err.as_message())
                });
                Some(err)
            }
        };

        if let Some(m) = &self.membership {
            m.group.leave(&name, m.counted, failure.as_ref());
        }
    }
}

impl<R: Clone + Send + 'static> Trigger for NodeInner<R> {
    fn core(&self) -> &Core {
        &self.core
    }

    fn fire(self: Arc<Self>) {
        if self.core.is_stopped() {
            self.try_finalize();
            return;
        }
        let next = self.core.firings.load(Ordering::Acquire) + 1;
        self.core.publish(|| {
            Event::new(EventKind::FiringScheduled)
                .with_node(self.core.name_arc())
                .with_firing(next)
        });

        let exec = self.core.executor();
        exec.execute(Box::new(move || self.run()));
    }
}

impl<R: Clone + Send + 'static> Stoppable for NodeInner<R> {
    fn stop(&self) -> bool {
        NodeInner::stop(self)
    }

    fn is_stopped(&self) -> bool {
        self.core.is_stopped()
    }
}

/// # Handle to a node.
///
/// Cheap to clone; all clones refer to the same node.
///
/// # Example
/// ```
/// use pinflow::{DirectExecutor, NodeBuilder};
///
/// let mut b = NodeBuilder::new("multiply").with_executor(DirectExecutor::new());
/// let a = b.const_input::<f64>().unwrap();
/// let c = b.const_input::<f64>().unwrap();
/// let node = b.task(move |f| Ok(f.get(a)? * f.get(c)?));
///
/// node.start();
/// node.port(a).post(3.0).unwrap();
/// node.port(c).post(4.0).unwrap();
/// assert_eq!(node.get(), Ok(12.0));
/// ```
pub struct Node<R> {
    inner: Arc<NodeInner<R>>,
}

impl<R> Clone for Node<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Clone + Send + 'static> std::fmt::Debug for Node<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("firings", &self.firings())
            .finish()
    }
}

impl<R: Clone + Send + 'static> Node<R> {
    pub(crate) fn from_inner(inner: Arc<NodeInner<R>>) -> Self {
        Self { inner }
    }

    pub(crate) fn group(&self) -> Option<&Arc<Group>> {
        self.inner.membership.as_ref().map(|m| &m.group)
    }

    pub(crate) fn stoppable(&self) -> Weak<dyn Stoppable> {
        let weak: Weak<NodeInner<R>> = Arc::downgrade(&self.inner);
        weak
    }

    /// Node name.
    pub fn name(&self) -> &str {
        self.inner.core.name()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NodeState {
        self.inner.core.state()
    }

    /// True once `start()` succeeded, even if the node has stopped since.
    pub fn is_started(&self) -> bool {
        self.inner.core.started.load(Ordering::SeqCst)
    }

    /// True once the node reached its terminal state.
    pub fn is_stopped(&self) -> bool {
        self.inner.core.is_stopped()
    }

    /// Number of runs started so far.
    pub fn firings(&self) -> u64 {
        self.inner.core.firings.load(Ordering::Acquire)
    }

    /// Number of pins (the control pin included) that are currently blocked.
    pub fn blocked_pins(&self) -> u32 {
        self.inner.core.mask.blocked_count()
    }

    /// Starts the node. Returns `false` if it was already started or stopped.
    ///
    /// May fire immediately if every data pin already holds a token.
    pub fn start(&self) -> bool {
        self.inner.start()
    }

    /// Replaces the executor, then starts.
    ///
    /// # Errors
    /// [`NodeError::AlreadyStarted`] if the node is not in `Created`.
    pub fn start_with<E: Executor>(&self, executor: E) -> Result<(), NodeError> {
        self.set_executor(executor)?;
        if self.start() {
            Ok(())
        } else {
            Err(NodeError::AlreadyStarted)
        }
    }

    /// Replaces the executor.
    ///
    /// # Errors
    /// [`NodeError::AlreadyStarted`] once `start()` was called.
    pub fn set_executor<E: Executor>(&self, executor: E) -> Result<(), NodeError> {
        if self.state() != NodeState::Created {
            return Err(NodeError::AlreadyStarted);
        }
        let mut slot = self
            .inner
            .core
            .executor
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Arc::new(executor);
        Ok(())
    }

    /// Stops the node. Returns `false` if it was already stopped.
    ///
    /// An in-flight run completes; nothing fires afterwards. If the node has not
    /// produced a result, readers observe [`ResultError::Stopped`].
    pub fn stop(&self) -> bool {
        self.inner.stop()
    }

    /// Producer handle for one of this node's pins.
    pub fn port<P: Copy>(&self, pin: P) -> Port<P> {
        let trigger: Arc<dyn Trigger> = Arc::clone(&self.inner) as Arc<dyn Trigger>;
        Port::new(trigger, pin)
    }

    /// The node's result cell.
    pub fn result(&self) -> Promise<R> {
        self.inner.result.clone()
    }

    /// Blocks until the node finishes.
    ///
    /// # Errors
    /// - [`ResultError::NotStarted`] if the node was never started,
    /// - [`ResultError::Stopped`] if it stopped without a value,
    /// - [`ResultError::Failed`] if a firing failed.
    pub fn get(&self) -> Result<R, ResultError> {
        self.check_started()?;
        self.inner.result.get()
    }

    /// Like [`get`](Self::get), giving up after `timeout`.
    pub fn get_timeout(&self, timeout: Duration) -> Result<R, ResultError> {
        self.check_started()?;
        self.inner.result.get_timeout(timeout)
    }

    /// Waits asynchronously until the node finishes.
    pub async fn join(&self) -> Result<R, ResultError> {
        self.check_started()?;
        self.inner.result.wait().await
    }

    fn check_started(&self) -> Result<(), ResultError> {
        if !self.is_started() && !self.inner.result.is_done() {
            return Err(ResultError::NotStarted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NodeBuilder;
    use crate::executors::{DirectExecutor, ManualExecutor, ThreadExecutor};
    use crate::pins::{Input, StreamItem};
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    const WAIT: Duration = Duration::from_secs(10);

    fn multiply(exec: impl Executor) -> (Node<f64>, Port<Input<f64>>, Port<Input<f64>>) {
        let mut b = NodeBuilder::new("multiply").with_executor(exec);
        let a = b.input::<f64>().unwrap();
        let c = b.input::<f64>().unwrap();
        let node = b.task(move |f| Ok(f.take(a)? * f.take(c)?));
        let (pa, pc) = (node.port(a), node.port(c));
        (node, pa, pc)
    }

    #[test]
    fn test_multiply_from_threads_in_both_orders() {
        for a_first in [true, false] {
            let (node, pa, pc) = multiply(ThreadExecutor::default());
            node.start();
            let (first, second): (Box<dyn FnOnce() + Send>, Box<dyn FnOnce() + Send>) = (
                Box::new(move || pa.post(3.0).unwrap()),
                Box::new(move || pc.post(4.0).unwrap()),
            );
            let (first, second) = if a_first { (first, second) } else { (second, first) };
            thread::spawn(first).join().unwrap();
            thread::spawn(second).join().unwrap();

            assert_eq!(node.get_timeout(WAIT), Ok(12.0));
            assert_eq!(node.firings(), 1);
            assert_eq!(node.state(), NodeState::Stopped);
        }
    }

    #[test]
    fn test_const_multiply_from_threads_in_both_orders() {
        for a_first in [true, false] {
            let mut b = NodeBuilder::new("const-multiply").with_executor(ThreadExecutor::default());
            let a = b.const_input::<f64>().unwrap();
            let c = b.const_input::<f64>().unwrap();
            let node = b.task(move |f| Ok(f.get(a)? * f.get(c)?));
            node.start();

            let (pa, pc) = (node.port(a), node.port(c));
            let post_a = move || pa.post(3.0).unwrap();
            let post_c = move || pc.post(4.0).unwrap();
            if a_first {
                thread::spawn(post_a).join().unwrap();
                thread::spawn(post_c).join().unwrap();
            } else {
                thread::spawn(post_c).join().unwrap();
                thread::spawn(post_a).join().unwrap();
            }

            assert_eq!(node.get_timeout(WAIT), Ok(12.0));
            assert_eq!(node.firings(), 1);
        }
    }

    #[test]
    fn test_tokens_before_start_fire_on_start() {
        let (node, pa, pc) = multiply(DirectExecutor::new());
        pa.post(2.0).unwrap();
        pc.post(5.0).unwrap();
        assert_eq!(node.firings(), 0);
        assert_eq!(node.blocked_pins(), 1);

        assert!(node.start());
        assert!(!node.start());
        assert_eq!(node.get(), Ok(10.0));
    }

    #[test]
    fn test_result_before_start_is_not_started() {
        let (node, _pa, _pc) = multiply(DirectExecutor::new());
        assert_eq!(node.get(), Err(ResultError::NotStarted));
        assert_eq!(
            node.get_timeout(Duration::from_millis(1)),
            Err(ResultError::NotStarted)
        );
    }

    #[test]
    fn test_stop_before_start_resolves_stopped() {
        let (node, pa, pc) = multiply(DirectExecutor::new());
        assert!(node.stop());
        assert!(!node.stop());
        assert!(!node.start());

        pa.post(1.0).unwrap();
        pc.post(1.0).unwrap();
        assert_eq!(node.firings(), 0);
        assert_eq!(node.get(), Err(ResultError::Stopped));
    }

    #[test]
    fn test_set_executor_after_start_fails() {
        let (node, _pa, _pc) = multiply(DirectExecutor::new());
        assert_eq!(node.set_executor(ManualExecutor::new()), Ok(()));
        node.start();
        assert_eq!(
            node.set_executor(DirectExecutor::new()),
            Err(NodeError::AlreadyStarted)
        );
        assert_eq!(
            node.start_with(DirectExecutor::new()),
            Err(NodeError::AlreadyStarted)
        );
    }

    #[test]
    fn test_overwrite_is_rejected() {
        let mut b = NodeBuilder::new("slots").with_executor(DirectExecutor::new());
        let x = b.input::<u8>().unwrap();
        let k = b.const_input::<u8>().unwrap();
        let node = b.task(move |f| Ok(f.take(x)? + f.get(k)?));

        let px = node.port(x);
        px.post(1).unwrap();
        assert_eq!(px.post(2), Err(PinError::AlreadySet));
        assert!(px.is_set());

        let pk = node.port(k);
        pk.post(10).unwrap();
        assert_eq!(pk.post(20), Err(PinError::AlreadySet));

        node.start();
        assert_eq!(node.get(), Ok(11));
    }

    #[test]
    fn test_foreign_pin_is_rejected() {
        let (node, _pa, _pc) = multiply(DirectExecutor::new());
        let mut other = NodeBuilder::new("other");
        let foreign = other.input::<f64>().unwrap();

        assert_eq!(node.port(foreign).post(1.0), Err(PinError::ForeignPin));
        assert!(!node.port(foreign).is_set());
    }

    #[test]
    fn test_stream_drains_then_end() {
        let mut b = NodeBuilder::new("drain").with_executor(DirectExecutor::new());
        let s = b.stream_input::<u32>().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let node = b.actor(move |f: &mut Firing<'_, ()>| {
            match f.take(s)? {
                StreamItem::Token(t) => log.lock().unwrap().push(t),
                StreamItem::End => f.stop(),
            }
            Ok(())
        });

        let port = node.port(s);
        for t in [1, 2, 3] {
            port.post(t).unwrap();
        }
        port.close().unwrap();
        assert_eq!(port.post(4), Err(PinError::ClosedStream));
        assert_eq!(port.len(), 3);

        node.start();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(node.firings(), 4);
        assert_eq!(node.get(), Err(ResultError::Stopped));
    }

    #[test]
    fn test_actor_after_end_stays_blocked() {
        let mut b = NodeBuilder::new("idle-after-end").with_executor(DirectExecutor::new());
        let s = b.stream_input::<u32>().unwrap();
        let node = b.actor(move |f: &mut Firing<'_, ()>| {
            f.take(s)?;
            Ok(())
        });

        let port = node.port(s);
        port.post(1).unwrap();
        port.post(2).unwrap();
        port.close().unwrap();
        node.start();

        assert_eq!(node.firings(), 3);
        assert_eq!(node.state(), NodeState::Started);
        assert_eq!(node.blocked_pins(), 1);
        assert_eq!(
            node.get_timeout(Duration::from_millis(5)),
            Err(ResultError::Timeout {
                timeout: Duration::from_millis(5)
            })
        );
        assert!(node.stop());
        assert_eq!(node.get(), Err(ResultError::Stopped));
    }

    #[test]
    fn test_at_most_one_job_queued() {
        let exec = Arc::new(ManualExecutor::new());
        let mut b = NodeBuilder::new("queued").with_executor(Arc::clone(&exec));
        let s = b.stream_input::<u32>().unwrap();
        let node = b.actor(move |f: &mut Firing<'_, ()>| {
            f.take(s)?;
            Ok(())
        });

        let port = node.port(s);
        port.post(1).unwrap();
        node.start();
        port.post(2).unwrap();
        port.post(3).unwrap();
        assert_eq!(exec.pending(), 1);

        // Each run re-arms and submits exactly one successor.
        assert!(exec.run_one());
        assert_eq!(exec.pending(), 1);
        assert_eq!(exec.run_all(), 2);
        assert_eq!(node.firings(), 3);
        assert_eq!(exec.pending(), 0);
    }

    #[test]
    fn test_pushback_is_redelivered() {
        let mut b = NodeBuilder::new("pushback").with_executor(DirectExecutor::new());
        let s = b.stream_input::<u32>().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let node = b.actor(move |f: &mut Firing<'_, ()>| {
            let item = f.take(s)?;
            if f.number() == 1 {
                f.pushback(s, item.clone())?;
                if f.pushback(s, item.clone()) != Err(PinError::PushbackPending) {
                    return Err(ActionError::fail("second pushback accepted"));
                }
                let again = f.take(s)?;
                if again != item {
                    return Err(ActionError::fail("pushback not returned first"));
                }
                f.pushback(s, again)?;
                return Ok(());
            }
            match item {
                StreamItem::Token(t) => log.lock().unwrap().push((f.number(), t)),
                StreamItem::End => f.stop(),
            }
            Ok(())
        });

        let port = node.port(s);
        port.post(7).unwrap();
        port.post(8).unwrap();
        port.close().unwrap();
        node.start();

        assert_eq!(node.get(), Err(ResultError::Stopped));
        assert_eq!(*seen.lock().unwrap(), vec![(2, 7), (3, 8)]);
        assert_eq!(node.firings(), 4);
    }

    #[test]
    fn test_permits_gate_firings() {
        let mut b = NodeBuilder::new("gate").with_executor(DirectExecutor::new());
        let p = b.permits(0).unwrap();
        let node = b.actor(move |f: &mut Firing<'_, ()>| {
            f.permits(p)?;
            Ok(())
        });
        node.start();

        let port = node.port(p);
        assert_eq!(port.release(-1), Err(PinError::IllegalArgument { delta: -1 }));
        port.release(2).unwrap();
        assert_eq!(node.firings(), 2);
        assert_eq!(port.count(), 0);

        port.acquire(3).unwrap();
        port.release(3).unwrap();
        assert_eq!(node.firings(), 2);
        port.release(1).unwrap();
        assert_eq!(node.firings(), 3);
        assert_eq!(port.count(), 0);
    }

    #[test]
    fn test_actor_completes_with_value() {
        let mut b = NodeBuilder::new("sum").with_executor(DirectExecutor::new());
        let s = b.stream_input::<u64>().unwrap();
        let mut total = 0;
        let node = b.actor(move |f| {
            match f.take(s)? {
                StreamItem::Token(t) => total += t,
                StreamItem::End => f.complete(total),
            }
            Ok(())
        });
        let port = node.port(s);
        node.start();
        for t in 1..=4 {
            port.post(t).unwrap();
        }
        port.close().unwrap();
        assert_eq!(node.get(), Ok(10));
        assert!(node.is_stopped());
    }

    #[test]
    fn test_failure_stops_node() {
        let mut b = NodeBuilder::new("failing").with_executor(DirectExecutor::new());
        let x = b.input::<u8>().unwrap();
        let node = b.actor(move |f: &mut Firing<'_, ()>| {
            let v = f.take(x)?;
            if v == 2 {
                return Err(ActionError::fail("two"));
            }
            Ok(())
        });
        node.start();
        let port = node.port(x);
        port.post(1).unwrap();
        port.post(2).unwrap();
        assert_eq!(node.get(), Err(ResultError::Failed(ActionError::fail("two"))));

        port.post(3).unwrap();
        assert_eq!(node.firings(), 2);
        assert_eq!(node.state(), NodeState::Stopped);
    }

    #[test]
    fn test_panic_is_a_failure() {
        let mut b = NodeBuilder::new("panicky").with_executor(DirectExecutor::new());
        let x = b.input::<u8>().unwrap();
        let node: Node<()> = b.task(move |f| {
            f.take(x)?;
            panic!("kaboom");
        });
        node.start();
        node.port(x).post(0).unwrap();
        assert_eq!(
            node.get(),
            Err(ResultError::Failed(ActionError::Panicked {
                info: "kaboom".into()
            }))
        );
    }

    #[test]
    fn test_stop_prevents_firing() {
        let (node, pa, pc) = multiply(DirectExecutor::new());
        node.start();
        pa.post(1.0).unwrap();
        assert!(node.stop());
        pc.post(2.0).unwrap();
        assert_eq!(node.firings(), 0);
        assert_eq!(node.get(), Err(ResultError::Stopped));
    }

    #[test]
    fn test_lifecycle_events() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let mut b = NodeBuilder::new("observed")
            .with_executor(DirectExecutor::new())
            .with_bus(bus);
        let x = b.input::<u8>().unwrap();
        let node = b.task(move |f| Ok(f.take(x)?));
        node.start();
        node.port(x).post(1).unwrap();
        assert_eq!(node.get(), Ok(1));

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::NodeStarted,
                EventKind::FiringScheduled,
                EventKind::FiringCompleted,
                EventKind::NodeCompleted,
            ]
        );
    }

    #[test]
    fn test_no_lost_wakeup_with_single_slot() {
        const N: u64 = 500;
        let mut b = NodeBuilder::new("counter").with_executor(ThreadExecutor::default());
        let x = b.input::<u64>().unwrap();
        let (mut sum, mut count) = (0, 0);
        let node = b.actor(move |f| {
            sum += f.take(x)?;
            count += 1;
            if count == N {
                f.complete(sum);
            }
            Ok(())
        });
        node.start();

        let port = node.port(x);
        let producer = thread::spawn(move || {
            for t in 0..N {
                while port.post(t) == Err(PinError::AlreadySet) {
                    thread::yield_now();
                }
            }
        });
        producer.join().unwrap();
        assert_eq!(node.get_timeout(WAIT), Ok(N * (N - 1) / 2));
    }

    fn run_contended(producers: usize, per_producer: usize) -> (usize, usize, u64) {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let consumed = Arc::new(AtomicUsize::new(0));

        let mut b = NodeBuilder::new("contended").with_executor(ThreadExecutor::default());
        let s = b.stream_input::<usize>().unwrap();
        let node = {
            let (in_flight, max_seen, consumed) =
                (Arc::clone(&in_flight), Arc::clone(&max_seen), Arc::clone(&consumed));
            b.actor(move |f: &mut Firing<'_, ()>| {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                match f.take(s)? {
                    StreamItem::Token(_) => {
                        consumed.fetch_add(1, Ordering::SeqCst);
                    }
                    StreamItem::End => f.stop(),
                }
                thread::yield_now();
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
        };
        node.start();

        let handles: Vec<_> = (0..producers)
            .map(|_| {
                let port = node.port(s);
                thread::spawn(move || {
                    for t in 0..per_producer {
                        port.post(t).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        node.port(s).close().unwrap();
        assert_eq!(node.get_timeout(WAIT), Err(ResultError::Stopped));

        (
            max_seen.load(Ordering::SeqCst),
            consumed.load(Ordering::SeqCst),
            node.firings(),
        )
    }

    /// N inputs, each posted once by its own thread: exactly one submission.
    fn fire_once_from_threads(pins: usize) -> (usize, usize, u64) {
        let exec = Arc::new(ManualExecutor::new());
        let mut b = NodeBuilder::new("fan-in").with_executor(Arc::clone(&exec));
        let inputs: Vec<_> = (0..pins).map(|_| b.input::<usize>().unwrap()).collect();
        let node = {
            let inputs = inputs.clone();
            b.task(move |f| {
                let mut sum = 0;
                for pin in &inputs {
                    sum += f.take(*pin)?;
                }
                Ok(sum)
            })
        };
        node.start();

        let barrier = Arc::new(std::sync::Barrier::new(pins));
        let handles: Vec<_> = inputs
            .iter()
            .enumerate()
            .map(|(i, pin)| {
                let port = node.port(*pin);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    port.post(i).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let submitted = exec.pending();
        let ran = exec.run_all();
        assert_eq!(node.get(), Ok(pins * (pins - 1) / 2));
        (submitted, ran, node.firings())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_concurrent_posts_submit_exactly_once(pins in 1usize..=8) {
            let (submitted, ran, firings) = fire_once_from_threads(pins);
            prop_assert_eq!(submitted, 1);
            prop_assert_eq!(ran, 1);
            prop_assert_eq!(firings, 1);
        }

        #[test]
        fn test_at_most_one_firing_in_flight(producers in 1usize..=8, per_producer in 1usize..40) {
            let (max_seen, consumed, firings) = run_contended(producers, per_producer);
            prop_assert_eq!(max_seen, 1);
            prop_assert_eq!(consumed, producers * per_producer);
            prop_assert_eq!(firings, (producers * per_producer) as u64 + 1);
        }
    }
}
