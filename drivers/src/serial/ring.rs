//! Fixed-capacity circular byte buffer.

use alloc::boxed::Box;
use alloc::vec;

/// Default ring capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 4000;

/// Fixed-capacity FIFO byte buffer with wraparound indices.
///
/// Invariants: `0 <= count <= capacity`, and the read and write indices
/// always satisfy `(write_index - read_index) mod capacity == count mod
/// capacity`. The buffer is never resized after construction.
///
/// `RingBuffer` carries no synchronization of its own; every caller holds
/// the owning channel's lock.
pub struct RingBuffer {
    buf: Box<[u8]>,
    read_index: usize,
    write_index: usize,
    count: usize,
}

impl RingBuffer {
    /// Allocate a ring holding up to `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            read_index: 0,
            write_index: 0,
            count: 0,
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of buffered bytes.
    pub fn available(&self) -> usize {
        self.count
    }

    /// Remaining space in bytes.
    pub fn free(&self) -> usize {
        self.buf.len() - self.count
    }

    /// True when no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True when no space remains.
    pub fn is_full(&self) -> bool {
        self.count == self.buf.len()
    }

    /// Append a byte. Returns `false`, leaving the ring untouched, when
    /// the ring is full. O(1), never blocks.
    pub fn try_push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.write_index] = byte;
        self.write_index = (self.write_index + 1) % self.buf.len();
        self.count += 1;
        true
    }

    /// Remove and return the oldest byte, or `None` when empty. O(1).
    pub fn try_pop(&mut self) -> Option<u8> {
        if self.count == 0 {
            return None;
        }
        let byte = self.buf[self.read_index];
        self.read_index = (self.read_index + 1) % self.buf.len();
        self.count -= 1;
        Some(byte)
    }

    /// Discard all buffered bytes and rewind both indices to zero.
    pub fn reset(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
        self.count = 0;
    }
}
