//! Queued input: FIFO tokens followed by one end marker after close.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use super::{sealed, typed_pin, Consume, Hand, Marker, PinId, PinSlot};
use crate::core::ReadinessMask;
use crate::error::PinError;

/// Id of a pin holding an unbounded FIFO of tokens.
///
/// After [`Port::close`](crate::Port::close) and once the queue is drained, the pin
/// delivers [`StreamItem::End`] exactly once and then stays blocked.
pub struct StreamInput<T> {
    id: PinId,
    _token: Marker<T>,
}

typed_pin!(StreamInput);

impl<T> sealed::Sealed for StreamInput<T> {}

impl<T: Send + 'static> Consume for StreamInput<T> {
    type Item = StreamItem<T>;

    fn pin_id(&self) -> PinId {
        self.id
    }
}

/// What a stream pin hands to the action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamItem<T> {
    /// A posted token.
    Token(T),
    /// The stream was closed and fully drained.
    End,
}

impl<T> StreamItem<T> {
    /// True for [`StreamItem::End`].
    pub fn is_end(&self) -> bool {
        matches!(self, StreamItem::End)
    }

    /// Returns the token, or `None` for the end marker.
    pub fn into_token(self) -> Option<T> {
        match self {
            StreamItem::Token(t) => Some(t),
            StreamItem::End => None,
        }
    }
}

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
    end_taken: bool,
}

impl<T> State<T> {
    fn ready(&self) -> bool {
        !self.queue.is_empty() || (self.closed && !self.end_taken)
    }

    fn take_front(&mut self) -> Option<StreamItem<T>> {
        if let Some(token) = self.queue.pop_front() {
            return Some(StreamItem::Token(token));
        }
        if self.closed && !self.end_taken {
            self.end_taken = true;
            return Some(StreamItem::End);
        }
        None
    }
}

pub(crate) struct StreamSlot<T> {
    state: Mutex<State<T>>,
}

impl<T: Send + 'static> StreamSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                closed: false,
                end_taken: false,
            }),
        }
    }

    /// Enqueues the token. Returns `true` if this call made the node ready.
    pub(crate) fn post(&self, bit: u8, mask: &ReadinessMask, token: T) -> Result<bool, PinError> {
        let mut st = self.lock();
        if st.closed {
            return Err(PinError::ClosedStream);
        }
        let was_ready = st.ready();
        st.queue.push_back(token);
        Ok(!was_ready && mask.turn_on_exclusive(bit))
    }

    /// Closes the stream. Idempotent.
    pub(crate) fn close(&self, bit: u8, mask: &ReadinessMask) -> bool {
        let mut st = self.lock();
        if st.closed {
            return false;
        }
        let was_ready = st.ready();
        st.closed = true;
        !was_ready && mask.turn_on_exclusive(bit)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().queue.len()
    }

    fn take(&self) -> Option<Hand> {
        let item = self.lock().take_front()?;
        Some(Box::new(item))
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Send + 'static> PinSlot for StreamSlot<T> {
    fn present(&self) -> Option<Hand> {
        self.take()
    }

    fn pull(&self) -> Option<Hand> {
        self.take()
    }

    fn purge(&self, bit: u8, mask: &ReadinessMask, returned: Option<Hand>) {
        let mut st = self.lock();
        match returned.and_then(|h| h.downcast::<StreamItem<T>>().ok()).map(|b| *b) {
            Some(StreamItem::Token(token)) => st.queue.push_front(token),
            Some(StreamItem::End) => st.end_taken = false,
            None => {}
        }
        if !st.ready() {
            mask.turn_off(bit);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ReadinessMask, u8, StreamSlot<u32>) {
        let mask = ReadinessMask::new();
        mask.register(false).unwrap();
        let bit = mask.register(true).unwrap();
        (mask, bit, StreamSlot::new())
    }

    fn unbox(h: Option<Hand>) -> Option<StreamItem<u32>> {
        h.map(|h| *h.downcast::<StreamItem<u32>>().unwrap())
    }

    #[test]
    fn test_fifo_then_single_end() {
        let (mask, bit, slot) = setup();
        for t in [1, 2, 3] {
            slot.post(bit, &mask, t).unwrap();
        }
        assert!(!slot.close(bit, &mask));
        assert!(!slot.close(bit, &mask));
        assert_eq!(slot.post(bit, &mask, 4), Err(PinError::ClosedStream));

        let mut seen = Vec::new();
        while let Some(item) = unbox(slot.present()) {
            seen.push(item);
            slot.purge(bit, &mask, None);
        }
        assert_eq!(
            seen,
            vec![
                StreamItem::Token(1),
                StreamItem::Token(2),
                StreamItem::Token(3),
                StreamItem::End
            ]
        );
        assert!(mask.is_blocked(bit));
    }

    #[test]
    fn test_close_on_empty_stream_makes_pin_ready() {
        let (mask, bit, slot) = setup();
        assert!(mask.is_blocked(bit));
        assert!(slot.close(bit, &mask));
        assert!(!mask.is_blocked(bit));
        assert_eq!(unbox(slot.present()), Some(StreamItem::End));
        slot.purge(bit, &mask, None);
        assert!(mask.is_blocked(bit));
        assert_eq!(unbox(slot.present()), None);
    }

    #[test]
    fn test_pushback_restores_front() {
        let (mask, bit, slot) = setup();
        slot.post(bit, &mask, 1).unwrap();
        slot.post(bit, &mask, 2).unwrap();

        let first = slot.present();
        slot.purge(bit, &mask, first);
        assert_eq!(unbox(slot.present()), Some(StreamItem::Token(1)));
        assert_eq!(slot.len(), 1);
    }

    #[test]
    fn test_pushback_of_end_delivers_it_again() {
        let (mask, bit, slot) = setup();
        slot.close(bit, &mask);
        let end = slot.present();
        slot.purge(bit, &mask, end);
        assert!(!mask.is_blocked(bit));
        assert_eq!(unbox(slot.present()), Some(StreamItem::End));
    }

    #[test]
    fn test_only_first_post_reports_edge() {
        let (mask, bit, slot) = setup();
        assert_eq!(slot.post(bit, &mask, 1), Ok(true));
        assert_eq!(slot.post(bit, &mask, 2), Ok(false));
        assert!(!slot.is_closed());
    }
}
