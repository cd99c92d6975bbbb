//! # Consumer-side view of one firing.
//!
//! When a node fires, each pin offers at most one token. The action receives a
//! [`Firing`] and reads those tokens through it; when the action returns, the
//! firing is purged: consumed tokens are gone, pushed back tokens return to the
//! front of their pin, counting pins give up one permit, and drained pins block
//! their bit again.
//!
//! ```text
//!   open ──► presented tokens (one per Input / StreamInput)
//!     │
//!     ├── get(const)          clone of the set-once value
//!     ├── current(pin)        peek, does not consume
//!     ├── next(pin) / take    consume: pushed back → presented → pulled from slot
//!     ├── pushback(pin, tok)  at most one pending per pin
//!     ├── complete(v) / stop()
//!     ▼
//!   purge ──► pushed back tokens restored, untaken presented tokens dropped
//! ```

use super::node::Core;
use crate::error::PinError;
use crate::pins::{Consume, ConstInput, ConstSlot, Hand, Permits, PermitsSlot};

/// Tokens and controls handed to an action for one run.
pub struct Firing<'a, R> {
    core: &'a Core,
    number: u64,
    presented: Vec<Option<Hand>>,
    pushed: Vec<Option<Hand>>,
    completion: Option<R>,
    stop: bool,
}

/// What the node does once the firing is purged.
pub(crate) struct Disposition<R> {
    pub(crate) completion: Option<R>,
    pub(crate) stop: bool,
}

impl<'a, R> Firing<'a, R> {
    pub(crate) fn open(core: &'a Core, number: u64) -> Self {
        let presented: Vec<_> = core.slots().iter().map(|s| s.present()).collect();
        let pushed = (0..presented.len()).map(|_| None).collect();
        Self {
            core,
            number,
            presented,
            pushed,
            completion: None,
            stop: false,
        }
    }

    /// 1-based number of this firing.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Name of the firing node.
    pub fn node_name(&self) -> &str {
        self.core.name()
    }

    /// Returns a clone of the set-once value of `pin`.
    pub fn get<T: Clone + Send + 'static>(&self, pin: ConstInput<T>) -> Result<T, PinError> {
        self.core.slot::<ConstSlot<T>>(pin.id())?.get()
    }

    /// Peeks at the token `next` would return, without consuming it.
    pub fn current<P: Consume>(&self, pin: P) -> Option<&P::Item> {
        let i = self.core.index(pin.pin_id()).ok()?;
        self.pushed[i]
            .as_ref()
            .or(self.presented[i].as_ref())?
            .downcast_ref::<P::Item>()
    }

    /// Consumes the next token of `pin`.
    ///
    /// Order: a pushed back token, then the token presented at fire time, then
    /// whatever producers delivered since. `None` when the pin has nothing left.
    pub fn next<P: Consume>(&mut self, pin: P) -> Result<Option<P::Item>, PinError> {
        let i = self.core.index(pin.pin_id())?;
        let hand = self.pushed[i]
            .take()
            .or_else(|| self.presented[i].take())
            .or_else(|| self.core.slots()[i].pull());
        Ok(hand.and_then(|h| h.downcast::<P::Item>().ok()).map(|b| *b))
    }

    /// Like [`next`](Self::next), but a missing token is [`PinError::Empty`].
    pub fn take<P: Consume>(&mut self, pin: P) -> Result<P::Item, PinError> {
        self.next(pin)?.ok_or(PinError::Empty)
    }

    /// Hands a token back. It is returned by the next `next` call, in this firing
    /// or, if not taken again, in the next one.
    ///
    /// # Errors
    /// [`PinError::PushbackPending`] if a pushed back token is already pending.
    pub fn pushback<P: Consume>(&mut self, pin: P, item: P::Item) -> Result<(), PinError> {
        let i = self.core.index(pin.pin_id())?;
        if self.pushed[i].is_some() {
            return Err(PinError::PushbackPending);
        }
        self.pushed[i] = Some(Box::new(item));
        Ok(())
    }

    /// Current permit count of a counting pin.
    pub fn permits(&self, pin: Permits) -> Result<i64, PinError> {
        Ok(self.core.slot::<PermitsSlot>(pin.id())?.count())
    }

    /// Completes the node with `value` once this firing returns. The node stops.
    ///
    /// Only the last call in a firing counts.
    pub fn complete(&mut self, value: R) {
        self.completion = Some(value);
    }

    /// Stops the node once this firing returns.
    pub fn stop(&mut self) {
        self.stop = true;
    }

    /// True if the firing asked to finish the node.
    pub fn is_finishing(&self) -> bool {
        self.stop || self.completion.is_some()
    }

    /// Purges every pin and returns what the node should do next.
    pub(crate) fn purge(mut self) -> Disposition<R> {
        let mask = self.core.mask();
        for (i, slot) in self.core.slots().iter().enumerate() {
            slot.purge(i as u8, mask, self.pushed[i].take());
        }
        Disposition {
            completion: self.completion.take(),
            stop: self.stop,
        }
    }
}
