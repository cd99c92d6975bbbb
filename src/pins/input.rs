//! Single-slot input: one token per firing, consumed afterwards.

use std::any::Any;
use std::sync::{Mutex, MutexGuard};

use super::{sealed, typed_pin, Consume, Hand, Marker, PinId, PinSlot};
use crate::core::ReadinessMask;
use crate::error::PinError;

/// Id of a pin holding at most one token that is consumed by each firing.
///
/// Taken in a firing with [`Firing::next`](crate::Firing::next); a token handed
/// back with [`Firing::pushback`](crate::Firing::pushback) is offered again to the
/// next firing without a new post.
pub struct Input<T> {
    id: PinId,
    _token: Marker<T>,
}

typed_pin!(Input);

impl<T> sealed::Sealed for Input<T> {}

impl<T: Send + 'static> Consume for Input<T> {
    type Item = T;

    fn pin_id(&self) -> PinId {
        self.id
    }
}

struct State<T> {
    /// Token posted by a producer.
    slot: Option<T>,
    /// Token pushed back by the consumer; offered before `slot`.
    front: Option<T>,
}

pub(crate) struct InputSlot<T> {
    state: Mutex<State<T>>,
}

impl<T: Send + 'static> InputSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                slot: None,
                front: None,
            }),
        }
    }

    /// Stores the token. Returns `true` if this call made the node ready.
    pub(crate) fn post(&self, bit: u8, mask: &ReadinessMask, token: T) -> Result<bool, PinError> {
        let mut st = self.lock();
        if st.slot.is_some() {
            return Err(PinError::AlreadySet);
        }
        st.slot = Some(token);
        Ok(mask.turn_on_exclusive(bit))
    }

    pub(crate) fn is_set(&self) -> bool {
        let st = self.lock();
        st.slot.is_some() || st.front.is_some()
    }

    fn take(&self) -> Option<Hand> {
        let mut st = self.lock();
        let token = st.front.take().or_else(|| st.slot.take())?;
        Some(Box::new(token))
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Send + 'static> PinSlot for InputSlot<T> {
    fn present(&self) -> Option<Hand> {
        self.take()
    }

    fn pull(&self) -> Option<Hand> {
        self.take()
    }

    fn purge(&self, bit: u8, mask: &ReadinessMask, returned: Option<Hand>) {
        let mut st = self.lock();
        if let Some(token) = returned.and_then(|h| h.downcast::<T>().ok()) {
            st.front = Some(*token);
        }
        if st.front.is_none() && st.slot.is_none() {
            mask.turn_off(bit);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
