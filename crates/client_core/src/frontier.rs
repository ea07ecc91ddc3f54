//! Lock boundary of a [`ContentQueue`].
//!
//! Locked items always form a suffix `[b, len)`. Clicking the lock of the
//! frontier item `b` toggles just that item off (`b + 1`); clicking any other
//! item moves the whole boundary to it.

use crate::queue::ContentQueue;

impl ContentQueue {
    /// Smallest locked index, or `len` when nothing is locked.
    pub fn boundary(&self) -> usize {
        self.items
            .iter()
            .position(|item| item.locked)
            .unwrap_or(self.items.len())
    }

    /// Newest item not yet committed. `None` when the queue is empty or fully locked.
    pub fn next_pending_index(&self) -> Option<usize> {
        self.boundary().checked_sub(1)
    }

    /// Applies a lock click on `requested` and returns the resulting boundary.
    ///
    /// Flags are re-derived for every item, which also repairs a queue whose
    /// locks were not a suffix.
    pub fn set_boundary(&mut self, requested: usize) -> usize {
        let boundary = if requested == self.boundary() {
            requested + 1
        } else {
            requested
        };

        for (index, item) in self.items.iter_mut().enumerate() {
            item.locked = index >= boundary;
        }
        self.touch();

        self.boundary()
    }

    pub fn locked_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.locked)
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
#[path = "tests/frontier_tests.rs"]
mod tests;
