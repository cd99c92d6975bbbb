//! Control pin: a payload-free bit that serializes a node's firings.
//!
//! Blocked while the node is not started, while a firing is scheduled or running,
//! and after the node stops.

use std::any::Any;

use super::PinSlot;
use crate::core::ReadinessMask;

pub(crate) struct ControlPin;

impl PinSlot for ControlPin {
    // The node re-arms the control bit itself once a firing is fully done.
    fn purge(&self, _bit: u8, _mask: &ReadinessMask, _returned: Option<super::Hand>) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}
