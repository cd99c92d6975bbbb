//! Counting pin: a permit counter that is ready while positive.

use std::any::Any;
use std::sync::{Mutex, MutexGuard};

use super::{Hand, PinId, PinSlot};
use crate::core::ReadinessMask;
use crate::error::PinError;

/// Id of a counting pin.
///
/// The counter may be pre-charged negative; the pin is ready iff `count > 0`.
/// Each firing acquires one permit during purge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permits {
    id: PinId,
}

impl Permits {
    pub(crate) fn new(id: PinId) -> Self {
        Self { id }
    }

    /// Address of the pin.
    pub fn id(&self) -> PinId {
        self.id
    }
}

pub(crate) struct PermitsSlot {
    count: Mutex<i64>,
}

impl PermitsSlot {
    pub(crate) fn new(initial: i64) -> Self {
        Self {
            count: Mutex::new(initial),
        }
    }

    /// Adds `n` permits. Returns `true` if this call made the node ready.
    pub(crate) fn release(&self, bit: u8, mask: &ReadinessMask, n: i64) -> Result<bool, PinError> {
        if n < 0 {
            return Err(PinError::IllegalArgument { delta: n });
        }
        let mut count = self.lock();
        let prev = *count;
        *count = prev.saturating_add(n);
        Ok(prev <= 0 && *count > 0 && mask.turn_on_exclusive(bit))
    }

    /// Removes `n` permits, blocking the pin when the count drops to zero or below.
    pub(crate) fn acquire(&self, bit: u8, mask: &ReadinessMask, n: i64) -> Result<(), PinError> {
        if n < 0 {
            return Err(PinError::IllegalArgument { delta: n });
        }
        let mut count = self.lock();
        let prev = *count;
        *count = prev.saturating_sub(n);
        if prev > 0 && *count <= 0 {
            mask.turn_off(bit);
        }
        Ok(())
    }

    pub(crate) fn count(&self) -> i64 {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, i64> {
        self.count.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PinSlot for PermitsSlot {
    fn purge(&self, bit: u8, mask: &ReadinessMask, _returned: Option<Hand>) {
        let _ = self.acquire(bit, mask, 1);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
