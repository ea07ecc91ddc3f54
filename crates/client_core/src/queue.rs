//! Ordered, lockable sequence of content items.
//!
//! The queue only checks bounds. Lock-aware guards live in the navigation
//! controller; the lock boundary itself lives in `frontier`.

use shared::domain::{ContentItem, Media};

use crate::error::QueueError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentQueue {
    pub(crate) items: Vec<ContentItem>,
    revision: u64,
}

impl ContentQueue {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items, revision: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ContentItem> {
        self.items.get(index)
    }

    /// Bumped by every successful mutation. Persistence compares it against the
    /// revision a save was issued for.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Indices past the end count as locked so moves cannot leave the queue.
    pub fn is_locked(&self, index: usize) -> bool {
        self.items.get(index).map_or(true, |item| item.locked)
    }

    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), QueueError> {
        self.check(i)?;
        self.check(j)?;
        self.items.swap(i, j);
        self.touch();
        Ok(())
    }

    pub fn set_caption(&mut self, index: usize, text: impl Into<String>) -> Result<(), QueueError> {
        self.check(index)?;
        self.items[index].caption = text.into();
        self.touch();
        Ok(())
    }

    /// Relative order is preserved, so a locked suffix stays a suffix.
    pub fn remove(&mut self, index: usize) -> Result<ContentItem, QueueError> {
        self.check(index)?;
        let removed = self.items.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Moves gallery member `member` of item `index` to the head of the gallery.
    pub fn promote_gallery_item(&mut self, index: usize, member: usize) -> Result<(), QueueError> {
        self.check(index)?;
        let Media::Gallery { media } = &mut self.items[index].media else {
            return Err(QueueError::NotAGallery { index });
        };
        if member >= media.len() {
            return Err(QueueError::GalleryMemberOutOfRange {
                index,
                member,
                size: media.len(),
            });
        }
        let head = media.remove(member);
        media.insert(0, head);
        self.touch();
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    fn check(&self, index: usize) -> Result<(), QueueError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(QueueError::OutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }
}

#[cfg(test)]
#[path = "tests/queue_tests.rs"]
mod tests;
