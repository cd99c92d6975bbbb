//! # Pins: per-node token holders bound to one bit of the readiness mask.
//!
//! A node owns an arena of pin slots indexed by bit. Outside the node a pin is
//! known only by a small typed id (node id + bit), so nothing ever holds a
//! back-reference from a pin to its node.
//!
//! ```text
//!             Node (arena)
//!   bit 0 ── ControlPin          serializes firings
//!   bit 1 ── ConstInput<f64>     set once, read every firing
//!   bit 2 ── Input<String>       one token, consumed per firing
//!   bit 3 ── StreamInput<u32>    FIFO queue + one End marker
//!   bit 4 ── Permits             counter, ready while > 0
//!
//!   producers ── Port<P>::post / close / release ──► slot ──► mask.turn_on
//!   action    ── Firing::get / current / next / pushback ──► slot
//! ```
//!
//! ## Rules
//! - Producer calls are thread-safe and never block beyond a short internal lock.
//! - Mask updates happen under the slot lock, so readiness always mirrors occupancy.
//! - A producer call that observes the readiness edge fires the node after
//!   releasing the slot lock.

mod const_input;
mod control;
mod input;
mod permits;
mod port;
mod stream;

use std::any::Any;
use std::marker::PhantomData;

use crate::core::ReadinessMask;

pub use const_input::ConstInput;
pub(crate) use const_input::ConstSlot;
pub(crate) use control::ControlPin;
pub use input::Input;
pub(crate) use input::InputSlot;
pub use permits::Permits;
pub(crate) use permits::PermitsSlot;
pub use port::Port;
pub use stream::{StreamInput, StreamItem};
pub(crate) use stream::StreamSlot;

/// A token moved between a slot and a firing.
pub(crate) type Hand = Box<dyn Any + Send>;

/// Address of one pin: owning node and bit index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PinId {
    pub(crate) node: u64,
    pub(crate) bit: u8,
}

impl PinId {
    /// Bit of the pin in its node's readiness mask.
    pub fn bit(&self) -> u8 {
        self.bit
    }
}

/// Storage side of a pin, owned by the node arena.
pub(crate) trait PinSlot: Send + Sync + 'static {
    /// Moves the token offered to the next firing out of the slot, if any.
    fn present(&self) -> Option<Hand> {
        None
    }

    /// Takes one more token during a firing.
    fn pull(&self) -> Option<Hand> {
        None
    }

    /// Post-firing cleanup. `returned` is a pushed back token to restore.
    ///
    /// Re-blocks `bit` in `mask` when the pin has nothing left to offer.
    fn purge(&self, bit: u8, mask: &ReadinessMask, returned: Option<Hand>);

    fn as_any(&self) -> &dyn Any;
}

mod sealed {
    pub trait Sealed {}
}

/// Pins whose tokens an action can take one by one.
///
/// Implemented for [`Input`] (items are `T`) and [`StreamInput`]
/// (items are [`StreamItem<T>`]).
pub trait Consume: sealed::Sealed + Copy {
    /// Type handed to the action.
    type Item: Send + 'static;

    #[doc(hidden)]
    fn pin_id(&self) -> PinId;
}

/// Zero-cost marker tying an id to a token type without owning a `T`.
pub(crate) type Marker<T> = PhantomData<fn() -> T>;

/// Implements the id boilerplate shared by all typed pins.
macro_rules! typed_pin {
    ($name:ident) => {
        impl<T> $name<T> {
            pub(crate) fn new(id: $crate::pins::PinId) -> Self {
                Self {
                    id,
                    _token: std::marker::PhantomData,
                }
            }

            /// Address of the pin.
            pub fn id(&self) -> $crate::pins::PinId {
                self.id
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> std::fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("node", &self.id.node)
                    .field("bit", &self.id.bit)
                    .finish()
            }
        }
    };
}

pub(crate) use typed_pin;
