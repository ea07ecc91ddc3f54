//! Keyboard and click driven selection over the queue grid.

use tracing::debug;

use crate::queue::ContentQueue;

pub const DEFAULT_GRID_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn delta(self, columns: usize) -> isize {
        let columns = columns as isize;
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Up => -columns,
            Direction::Down => columns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moved {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone)]
pub struct NavigationController {
    columns: usize,
    selected: Option<usize>,
    editing: Option<usize>,
}

impl NavigationController {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            selected: None,
            editing: None,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn escape(&mut self) {
        self.selected = None;
        self.editing = None;
    }

    /// Moves the selected item one step and keeps it selected. Both endpoints
    /// must be unlocked; anything else is silently ignored.
    pub fn move_selection(
        &mut self,
        queue: &mut ContentQueue,
        direction: Direction,
    ) -> Option<Moved> {
        if self.editing.is_some() {
            return None;
        }
        let from = self.selected?;
        let to = from.checked_add_signed(direction.delta(self.columns))?;
        if queue.is_locked(from) || queue.is_locked(to) {
            debug!(from, to, "move blocked by lock or edge");
            return None;
        }

        queue.swap(from, to).ok()?;
        self.selected = Some(to);
        Some(Moved { from, to })
    }

    /// Toggles selection of `index`. Returns whether the selection changed.
    pub fn click(&mut self, queue: &ContentQueue, index: usize) -> bool {
        if self.editing.is_some() || queue.is_locked(index) {
            return false;
        }
        if self.selected == Some(index) {
            self.selected = None;
        } else {
            self.selected = Some(index);
        }
        true
    }

    /// Opens the editor on an unlocked item. Only one item is edited at a time.
    pub fn begin_edit(&mut self, queue: &ContentQueue, index: usize) -> bool {
        if self.editing.is_some() || queue.is_locked(index) {
            return false;
        }
        self.editing = Some(index);
        self.selected = None;
        true
    }

    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    /// Forgets indices that belonged to a queue that has been replaced.
    pub fn reset(&mut self) {
        self.selected = None;
        self.editing = None;
    }
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_COLUMNS)
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
