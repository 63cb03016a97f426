// src/receiver/ring.rs

use crate::common::packet::RING_CAPACITY;

/// Write position inside the bit-timing ring. All wraparound lives here.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RingCursor(usize);

impl RingCursor {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// The slot `n` positions after this one.
    #[inline]
    pub const fn ahead(self, n: usize) -> Self {
        RingCursor((self.0 + n % RING_CAPACITY) % RING_CAPACITY)
    }

    /// The slot `n` positions before this one.
    #[inline]
    pub const fn behind(self, n: usize) -> Self {
        RingCursor((self.0 + RING_CAPACITY - n % RING_CAPACITY) % RING_CAPACITY)
    }
}

/// Fixed-capacity circular store of the most recent period measurements.
///
/// Entries start at zero and are overwritten oldest first.
#[derive(Debug, Clone)]
pub struct BitTimingRing {
    entries: [u16; RING_CAPACITY],
    cursor: RingCursor,
}

impl BitTimingRing {
    pub const fn new() -> Self {
        BitTimingRing { entries: [0; RING_CAPACITY], cursor: RingCursor(0) }
    }

    /// Stores `period` at the cursor and advances it.
    pub fn push(&mut self, period: u16) {
        self.entries[self.cursor.index()] = period;
        self.cursor = self.cursor.ahead(1);
    }

    /// Slot the next `push` will overwrite, i.e. the oldest entry.
    #[inline]
    pub fn cursor(&self) -> RingCursor {
        self.cursor
    }

    /// The `n` most recent entries, oldest first. `n` is capped at the capacity.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = u16> + '_ {
        let n = n.min(RING_CAPACITY);
        let start = self.cursor.behind(n);
        (0..n).map(move |i| self.entries[start.ahead(i).index()])
    }

    /// Every entry, oldest first.
    pub fn oldest_first(&self) -> impl Iterator<Item = u16> + '_ {
        self.recent(RING_CAPACITY)
    }
}

impl Default for BitTimingRing {
    fn default() -> Self {
        Self::new()
    }
}
