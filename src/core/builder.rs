//! # Node construction.
//!
//! [`NodeBuilder`] registers pins in order (bit 0 is the control pin), collects the
//! executor, bus and restart policy, and finally binds an action.
//!
//! ```text
//! NodeBuilder::new("sum")
//!   ├─► const_input / input / stream_input / permits   (returns typed pin ids)
//!   ├─► with_executor / with_bus / with_restart / daemon
//!   └─► build(action) | task(closure) | actor(closure)  ──► Node<R>
//! ```
//!
//! Pins cannot be added after `build`, so the arena is fixed before the node can fire.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::dataflow::Group;
use super::firing::Firing;
use super::mask::{ReadinessMask, CONTROL_BIT};
use super::node::{Core, Membership, Node, NodeInner};
use crate::actions::{Action, ActionFn, TaskFn};
use crate::error::{ActionError, NodeError};
use crate::events::Bus;
use crate::executors::{default_executor, Executor, ExecutorRef};
use crate::pins::{
    ConstInput, ConstSlot, ControlPin, Input, InputSlot, PinId, PinSlot, Permits, PermitsSlot,
    StreamInput, StreamSlot,
};
use crate::policies::RestartPolicy;

/// Process-wide node id counter; pin ids carry it to detect foreign pins.
static NODE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Builder for a [`Node`].
pub struct NodeBuilder {
    id: u64,
    name: Arc<str>,
    mask: ReadinessMask,
    slots: Vec<Box<dyn PinSlot>>,
    executor: Option<ExecutorRef>,
    bus: Option<Bus>,
    restart: RestartPolicy,
    group: Option<Arc<Group>>,
    daemon: bool,
}

impl NodeBuilder {
    /// Starts a node with only its control pin registered (blocked).
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let mask = ReadinessMask::new();
        let control = mask.register(true);
        debug_assert_eq!(control, Ok(CONTROL_BIT));

        Self {
            id: NODE_SEQ.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            mask,
            slots: vec![Box::new(ControlPin)],
            executor: None,
            bus: None,
            restart: RestartPolicy::default(),
            group: None,
            daemon: false,
        }
    }

    pub(crate) fn in_group(mut self, group: Arc<Group>) -> Self {
        self.group = Some(group);
        self
    }

    fn register<S: PinSlot>(&mut self, slot: S, blocked: bool) -> Result<PinId, NodeError> {
        let bit = self.mask.register(blocked)?;
        self.slots.push(Box::new(slot));
        Ok(PinId { node: self.id, bit })
    }

    /// Adds a set-once input pin.
    ///
    /// # Errors
    /// [`NodeError::CapacityExceeded`] past [`MAX_PINS`](crate::MAX_PINS) pins.
    pub fn const_input<T: Clone + Send + 'static>(&mut self) -> Result<ConstInput<T>, NodeError> {
        self.register(ConstSlot::<T>::new(), true)
            .map(ConstInput::new)
    }

    /// Adds a single-slot input pin consumed by every firing.
    pub fn input<T: Send + 'static>(&mut self) -> Result<Input<T>, NodeError> {
        self.register(InputSlot::<T>::new(), true).map(Input::new)
    }

    /// Adds a queued stream input pin.
    pub fn stream_input<T: Send + 'static>(&mut self) -> Result<StreamInput<T>, NodeError> {
        self.register(StreamSlot::<T>::new(), true)
            .map(StreamInput::new)
    }

    /// Adds a counting pin holding `initial` permits (may be negative).
    pub fn permits(&mut self, initial: i64) -> Result<Permits, NodeError> {
        self.register(PermitsSlot::new(initial), initial <= 0)
            .map(Permits::new)
    }

    /// Number of pins registered so far, the control pin included.
    pub fn pin_count(&self) -> usize {
        self.slots.len()
    }

    /// Runs firings on `executor` instead of the default one.
    pub fn with_executor<E: Executor>(mut self, executor: E) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Publishes lifecycle events on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Sets the restart policy used by [`build`](Self::build).
    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    /// Inside a dataflow: the node does not hold the dataflow open.
    ///
    /// It is still stopped together with the other members.
    pub fn daemon(mut self) -> Self {
        self.daemon = true;
        self
    }

    pub(crate) fn set_executor_ref(&mut self, executor: ExecutorRef) {
        self.executor = Some(executor);
    }

    pub(crate) fn set_restart(&mut self, restart: RestartPolicy) {
        self.restart = restart;
    }

    /// Binds `action` and returns the node, not yet started.
    pub fn build<R, A>(self, action: A) -> Node<R>
    where
        R: Clone + Send + 'static,
        A: Action<R>,
    {
        let executor = self.executor.unwrap_or_else(default_executor);
        let core = Core::new(self.id, self.name, self.mask, self.slots, executor, self.bus);
        let counted = !self.daemon;
        let membership = self.group.map(|group| Membership { group, counted });

        let inner = Arc::new(NodeInner::new(core, Box::new(action), self.restart, membership));
        let node = Node::from_inner(inner);
        if let Some(group) = node.group() {
            group.enter(node.name(), node.stoppable(), counted);
        }
        node
    }

    /// One-shot node: fires once and completes with the closure's value.
    pub fn task<R, F>(self, f: F) -> Node<R>
    where
        R: Clone + Send + 'static,
        F: FnMut(&mut Firing<'_, R>) -> Result<R, ActionError> + Send + 'static,
    {
        self.with_restart(RestartPolicy::Never).build(TaskFn::new(f))
    }

    /// Restartable node: re-arms after every successful firing until it completes,
    /// stops or fails.
    pub fn actor<R, F>(self, f: F) -> Node<R>
    where
        R: Clone + Send + 'static,
        F: FnMut(&mut Firing<'_, R>) -> Result<(), ActionError> + Send + 'static,
    {
        self.with_restart(RestartPolicy::Always)
            .build(ActionFn::new(f))
    }

    /// Restartable node driven by a custom [`Action`].
    pub fn actor_with<R, A>(self, action: A) -> Node<R>
    where
        R: Clone + Send + 'static,
        A: Action<R>,
    {
        self.with_restart(RestartPolicy::Always).build(action)
    }
}

impl std::fmt::Debug for NodeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeBuilder")
            .field("name", &self.name)
            .field("pins", &self.slots.len())
            .field("restart", &self.restart)
            .field("daemon", &self.daemon)
            .finish()
    }
}
