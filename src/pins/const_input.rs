//! Set-once input: the token stays after every firing.

use std::any::Any;
use std::sync::Mutex;

use super::{typed_pin, Hand, Marker, PinId, PinSlot};
use crate::core::ReadinessMask;
use crate::error::PinError;

/// Id of a pin holding one immutable token.
///
/// Read in a firing with [`Firing::get`](crate::Firing::get).
pub struct ConstInput<T> {
    id: PinId,
    _token: Marker<T>,
}

typed_pin!(ConstInput);

pub(crate) struct ConstSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T: Clone + Send + 'static> ConstSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Stores the token. Returns `true` if this call made the node ready.
    pub(crate) fn post(&self, bit: u8, mask: &ReadinessMask, token: T) -> Result<bool, PinError> {
        let mut value = self.value.lock().unwrap_or_else(|e| e.into_inner());
        if value.is_some() {
            return Err(PinError::AlreadySet);
        }
        *value = Some(token);
        Ok(mask.turn_on_exclusive(bit))
    }

    pub(crate) fn get(&self) -> Result<T, PinError> {
        self.value
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(PinError::Empty)
    }

    pub(crate) fn is_set(&self) -> bool {
        self.value.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

impl<T: Clone + Send + 'static> PinSlot for ConstSlot<T> {
    fn purge(&self, _bit: u8, _mask: &ReadinessMask, _returned: Option<Hand>) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}
