//! # Readiness mask: which pins of a node are still blocked.
//!
//! One bit per registered pin. Bit `i` is set ⇔ pin `i` is blocked.
//! The node may fire ⇔ the whole mask is zero.
//!
//! ```text
//!  bit:   63 ............ 3   2   1   0
//!         [ unused ...  ][p3][p2][p1][ctl]
//!                                     └── control pin, reserved by every node
//! ```
//!
//! ## Rules
//! - Every update is a single atomic read-modify-write (`fetch_and` / `fetch_or`).
//! - [`ReadinessMask::turn_on`] returns `true` only for the call that moved the mask
//!   from non-zero to zero, so concurrent producers never both observe the edge and
//!   never miss it.
//! - [`ReadinessMask::turn_on_exclusive`] additionally re-blocks the control bit in the
//!   same update that observes the edge, so the node is claimed before any other
//!   thread can see it ready.
//! - Registration hands out bits in order and fails past [`MAX_PINS`].

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::NodeError;

/// Maximum number of pins per node, control pin included.
pub const MAX_PINS: usize = 64;

/// Bit reserved for the node's control pin.
pub(crate) const CONTROL_BIT: u8 = 0;

/// Atomic bit set of blocked pins.
#[derive(Debug, Default)]
pub struct ReadinessMask {
    bits: AtomicU64,
    registered: AtomicUsize,
}

impl ReadinessMask {
    /// Creates an empty mask. With no pins registered it is vacuously ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next unused bit.
    ///
    /// If `initially_blocked`, the bit is set before the index is returned.
    pub fn register(&self, initially_blocked: bool) -> Result<u8, NodeError> {
        let index = self
            .registered
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < MAX_PINS).then_some(n + 1)
            })
            .map_err(|_| NodeError::CapacityExceeded { limit: MAX_PINS })?;

        let bit = index as u8;
        if initially_blocked {
            self.turn_off(bit);
        }
        Ok(bit)
    }

    /// Marks the pin as blocked. Idempotent.
    #[inline]
    pub fn turn_off(&self, bit: u8) {
        self.bits.fetch_or(Self::flag(bit), Ordering::AcqRel);
    }

    /// Marks the pin as ready.
    ///
    /// Returns `true` iff this call cleared the last blocked bit.
    #[inline]
    pub fn turn_on(&self, bit: u8) -> bool {
        let flag = Self::flag(bit);
        let prev = self.bits.fetch_and(!flag, Ordering::AcqRel);
        prev == flag
    }

    /// Marks the pin as ready and claims the node on the edge.
    ///
    /// Returns `true` iff this call cleared the last blocked bit. In that case the
    /// mask is left with only [`CONTROL_BIT`] set instead of zero, in one atomic step.
    pub fn turn_on_exclusive(&self, bit: u8) -> bool {
        let flag = Self::flag(bit);
        let claim = Self::flag(CONTROL_BIT);
        let mut edge = false;
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                edge = bits == flag;
                Some(if edge { claim } else { bits & !flag })
            });
        edge
    }

    /// True if no pin is blocked.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.bits.load(Ordering::Acquire) == 0
    }

    /// True if the given pin is currently blocked.
    #[inline]
    pub fn is_blocked(&self, bit: u8) -> bool {
        self.bits.load(Ordering::Acquire) & Self::flag(bit) != 0
    }

    /// Number of currently blocked pins.
    pub fn blocked_count(&self) -> u32 {
        self.bits.load(Ordering::Acquire).count_ones()
    }

    /// Number of registered pins.
    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::Acquire)
    }

    #[inline]
    fn flag(bit: u8) -> u64 {
        1u64 << (bit as u32 % MAX_PINS as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_empty_mask_is_ready() {
        let mask = ReadinessMask::new();
        assert!(mask.is_ready());
        assert_eq!(mask.registered(), 0);
    }

    #[test]
    fn test_register_assigns_bits_in_order() {
        let mask = ReadinessMask::new();
        assert_eq!(mask.register(true).unwrap(), 0);
        assert_eq!(mask.register(false).unwrap(), 1);
        assert_eq!(mask.register(true).unwrap(), 2);
        assert_eq!(mask.blocked_count(), 2);
        assert!(mask.is_blocked(0));
        assert!(!mask.is_blocked(1));
        assert!(mask.is_blocked(2));
    }

    #[test]
    fn test_register_past_capacity_fails() {
        let mask = ReadinessMask::new();
        for _ in 0..MAX_PINS {
            mask.register(true).unwrap();
        }
        assert_eq!(
            mask.register(true),
            Err(NodeError::CapacityExceeded { limit: MAX_PINS })
        );
        assert_eq!(mask.registered(), MAX_PINS);
    }

    #[test]
    fn test_turn_on_reports_only_the_last_edge() {
        let mask = ReadinessMask::new();
        let a = mask.register(true).unwrap();
        let b = mask.register(true).unwrap();

        assert!(!mask.turn_on(a));
        assert!(mask.turn_on(b));
        assert!(mask.is_ready());

        // Already clear: no second edge.
        assert!(!mask.turn_on(b));
        assert!(!mask.turn_on(a));
    }

    #[test]
    fn test_exclusive_edge_claims_control_bit() {
        let mask = ReadinessMask::new();
        let ctl = mask.register(true).unwrap();
        let a = mask.register(true).unwrap();

        assert!(!mask.turn_on_exclusive(ctl));
        assert!(mask.turn_on_exclusive(a));
        assert!(mask.is_blocked(CONTROL_BIT));
        assert!(!mask.is_blocked(a));

        // Claimed: releasing data bits again cannot produce a second edge.
        mask.turn_off(a);
        assert!(!mask.turn_on_exclusive(a));

        // Releasing the control bit re-arms.
        assert!(mask.turn_on_exclusive(ctl));
        assert!(mask.is_blocked(CONTROL_BIT));
    }

    #[test]
    fn test_turn_off_is_idempotent() {
        let mask = ReadinessMask::new();
        let a = mask.register(false).unwrap();
        mask.turn_off(a);
        mask.turn_off(a);
        assert_eq!(mask.blocked_count(), 1);
        assert!(mask.turn_on(a));
    }

    #[test]
    fn test_highest_bit_is_usable() {
        let mask = ReadinessMask::new();
        let mut last = 0;
        for _ in 0..MAX_PINS {
            last = mask.register(true).unwrap();
        }
        assert_eq!(last, 63);
        for bit in 0..63 {
            assert!(!mask.turn_on(bit));
        }
        assert!(mask.turn_on(last));
    }

    #[test]
    fn test_concurrent_turn_on_single_edge() {
        for _ in 0..200 {
            let mask = Arc::new(ReadinessMask::new());
            let n = 8;
            for _ in 0..n {
                mask.register(true).unwrap();
            }
            let barrier = Arc::new(Barrier::new(n));
            let handles: Vec<_> = (0..n as u8)
                .map(|bit| {
                    let mask = Arc::clone(&mask);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        if bit % 2 == 0 {
                            mask.turn_on(bit)
                        } else {
                            mask.turn_on_exclusive(bit)
                        }
                    })
                })
                .collect();

            let edges = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|edge| *edge)
                .count();
            assert_eq!(edges, 1);
            assert!(mask.is_ready() || mask.is_blocked(CONTROL_BIT));
        }
    }
}
