//! Fixed-capacity transmit FIFO between the AT encoder and the pump.
//!
//! Backed by a `heapless::Deque`, so head and tail wrap independently:
//! up to `N` bytes may be pending at any time, and draining one byte
//! frees one slot. Bytes that do not fit are dropped and counted; the
//! producer is never told.

use heapless::Deque;

/// Pending output bytes, oldest first.
pub struct TransmitQueue<const N: usize> {
    buf: Deque<u8, N>,
    dropped: usize,
}

impl<const N: usize> TransmitQueue<N> {
    pub const fn new() -> Self {
        Self {
            buf: Deque::new(),
            dropped: 0,
        }
    }

    /// Append one byte. A full queue silently discards it.
    pub fn enqueue(&mut self, byte: u8) {
        if self.buf.push_back(byte).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
        }
    }

    /// Append `bytes` in order, each independently of the others.
    /// Returns how many were accepted; the rest were dropped.
    pub fn enqueue_bulk(&mut self, bytes: &[u8]) -> usize {
        let before = self.buf.len();
        for &byte in bytes {
            self.enqueue(byte);
        }
        let accepted = self.buf.len() - before;
        if accepted < bytes.len() {
            warn!(
                "tx queue full: dropped {} of {} bytes",
                bytes.len() - accepted,
                bytes.len()
            );
        }
        accepted
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes waiting to be sent.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Free slots left before bytes start being dropped.
    pub fn free(&self) -> usize {
        N - self.buf.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Total bytes discarded because the queue was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Offer the oldest byte to `write`. The byte is consumed only when
    /// `write` returns `Ok(true)`. Returns whether a byte left the queue.
    pub fn try_send_one<E>(
        &mut self,
        write: impl FnOnce(u8) -> Result<bool, E>,
    ) -> Result<bool, E> {
        let Some(&byte) = self.buf.front() else {
            return Ok(false);
        };
        if !write(byte)? {
            return Ok(false);
        }
        self.buf.pop_front();
        Ok(true)
    }
}

impl<const N: usize> Default for TransmitQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
