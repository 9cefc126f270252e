//! A fixed-size page over an unbounded ordered index space.
//!
//! The same window serves the track mixer and the FX parameter list; only
//! the page size and the live count differ. Invariant: `start` is always a
//! multiple of the page size and never exceeds the current count.

use nihia_proto::BANK_SLOTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bank {
    start: usize,
    page: usize,
}

impl Default for Bank {
    fn default() -> Self {
        Self::new(BANK_SLOTS)
    }
}

impl Bank {
    pub fn new(page: usize) -> Self {
        assert!(page > 0);
        Self { start: 0, page }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn page_size(&self) -> usize {
        self.page
    }

    /// Jump to the page containing `index`. Returns whether the visible page
    /// actually changed, so callers know to refresh the whole page rather
    /// than a single slot.
    pub fn select_page(&mut self, index: usize) -> bool {
        let new_start = (index / self.page) * self.page;
        let changed = new_start != self.start;
        self.start = new_start;
        changed
    }

    /// Whether a page shift in `direction` (negative = previous) would land
    /// on a non-empty page. This is also the prev/next light state.
    pub fn can_shift(&self, direction: i32, count: usize) -> bool {
        if direction < 0 {
            self.start > 0
        } else {
            self.start + self.page < count
        }
    }

    /// Shift one page in `direction`, clamped to the valid range. Returns
    /// false (and leaves the window alone) when the shift would run off
    /// either end.
    pub fn shift(&mut self, direction: i32, count: usize) -> bool {
        if !self.can_shift(direction, count) {
            return false;
        }
        if direction < 0 {
            self.start -= self.page;
        } else {
            self.start += self.page;
        }
        true
    }

    /// Re-clamp after the underlying list changed size. If the window now
    /// starts past the end, it moves to the start of the last valid page.
    pub fn clamp_to_count(&mut self, count: usize) {
        if self.start >= count {
            let last_page = if count == 0 {
                0
            } else {
                ((count - 1) / self.page) * self.page
            };
            self.start = last_page;
        }
    }

    /// Slot of an absolute index, if it falls inside the visible page.
    pub fn slot_of(&self, index: usize) -> Option<usize> {
        if index >= self.start && index < self.start + self.page {
            Some(index - self.start)
        } else {
            None
        }
    }

    /// Absolute index shown in a slot.
    pub fn index_of(&self, slot: usize) -> usize {
        self.start + slot
    }
}
