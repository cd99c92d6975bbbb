//! # Producer handles.
//!
//! A [`Port`] pairs a node with one of its pin ids. It is cheap to clone, `Send` and
//! `Sync`, so tokens can be delivered from any thread, including from inside another
//! node's action.
//!
//! ```text
//! let a = builder.const_input::<f64>()?;   // id, known at build time
//! let node = builder.build(action);
//! let port = node.port(a);                 // node + id
//! thread::spawn(move || port.post(3.0));   // may fire the node
//! ```

use std::fmt;
use std::sync::Arc;

use super::{ConstInput, ConstSlot, Input, InputSlot, Permits, PermitsSlot, StreamInput, StreamSlot};
use crate::core::Trigger;
use crate::error::PinError;

/// Handle used by producers to deliver tokens to one pin of one node.
pub struct Port<P> {
    node: Arc<dyn Trigger>,
    pin: P,
}

impl<P: Copy> Port<P> {
    pub(crate) fn new(node: Arc<dyn Trigger>, pin: P) -> Self {
        Self { node, pin }
    }

    /// The pin this port delivers to.
    pub fn pin(&self) -> P {
        self.pin
    }

    /// Name of the receiving node.
    pub fn node_name(&self) -> &str {
        self.node.core().name()
    }

    fn fire_if(&self, edge: bool) {
        if edge {
            Arc::clone(&self.node).fire();
        }
    }
}

impl<P: Copy> Clone for Port<P> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            pin: self.pin,
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for Port<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("node", &self.node.core().name())
            .field("pin", &self.pin)
            .finish()
    }
}

impl<T: Clone + Send + 'static> Port<ConstInput<T>> {
    /// Sets the value.
    ///
    /// # Errors
    /// [`PinError::AlreadySet`] if a value was posted before.
    pub fn post(&self, token: T) -> Result<(), PinError> {
        let core = self.node.core();
        let id = self.pin.id();
        let edge = core.slot::<ConstSlot<T>>(id)?.post(id.bit, core.mask(), token)?;
        self.fire_if(edge);
        Ok(())
    }

    /// True once a value was posted.
    pub fn is_set(&self) -> bool {
        self.node
            .core()
            .slot::<ConstSlot<T>>(self.pin.id())
            .map(|s| s.is_set())
            .unwrap_or(false)
    }
}

impl<T: Send + 'static> Port<Input<T>> {
    /// Delivers one token.
    ///
    /// # Errors
    /// [`PinError::AlreadySet`] while the previous token is still unconsumed.
    pub fn post(&self, token: T) -> Result<(), PinError> {
        let core = self.node.core();
        let id = self.pin.id();
        let edge = core.slot::<InputSlot<T>>(id)?.post(id.bit, core.mask(), token)?;
        self.fire_if(edge);
        Ok(())
    }

    /// True while a token waits to be consumed.
    pub fn is_set(&self) -> bool {
        self.node
            .core()
            .slot::<InputSlot<T>>(self.pin.id())
            .map(|s| s.is_set())
            .unwrap_or(false)
    }
}

impl<T: Send + 'static> Port<StreamInput<T>> {
    /// Appends one token to the stream.
    ///
    /// # Errors
    /// [`PinError::ClosedStream`] after [`close`](Self::close).
    pub fn post(&self, token: T) -> Result<(), PinError> {
        let core = self.node.core();
        let id = self.pin.id();
        let edge = core.slot::<StreamSlot<T>>(id)?.post(id.bit, core.mask(), token)?;
        self.fire_if(edge);
        Ok(())
    }

    /// Closes the stream. The consumer sees [`StreamItem::End`](super::StreamItem::End)
    /// once after the queued tokens. Idempotent.
    pub fn close(&self) -> Result<(), PinError> {
        let core = self.node.core();
        let id = self.pin.id();
        let edge = core.slot::<StreamSlot<T>>(id)?.close(id.bit, core.mask());
        self.fire_if(edge);
        Ok(())
    }

    /// True once closed.
    pub fn is_closed(&self) -> bool {
        self.node
            .core()
            .slot::<StreamSlot<T>>(self.pin.id())
            .map(|s| s.is_closed())
            .unwrap_or(false)
    }

    /// Number of queued tokens not yet offered to a firing.
    pub fn len(&self) -> usize {
        self.node
            .core()
            .slot::<StreamSlot<T>>(self.pin.id())
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// True if no tokens are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Port<Permits> {
    /// Adds `n` permits.
    ///
    /// # Errors
    /// [`PinError::IllegalArgument`] if `n < 0`; the counter is left unchanged.
    pub fn release(&self, n: i64) -> Result<(), PinError> {
        let core = self.node.core();
        let id = self.pin.id();
        let edge = core.slot::<PermitsSlot>(id)?.release(id.bit, core.mask(), n)?;
        self.fire_if(edge);
        Ok(())
    }

    /// Removes `n` permits without firing anything.
    ///
    /// # Errors
    /// [`PinError::IllegalArgument`] if `n < 0`.
    pub fn acquire(&self, n: i64) -> Result<(), PinError> {
        let core = self.node.core();
        let id = self.pin.id();
        core.slot::<PermitsSlot>(id)?.acquire(id.bit, core.mask(), n)
    }

    /// Current permit count.
    pub fn count(&self) -> i64 {
        self.node
            .core()
            .slot::<PermitsSlot>(self.pin.id())
            .map(|s| s.count())
            .unwrap_or(0)
    }
}
