//! Render-ready snapshot of a session, published after every state change.

use shared::domain::{AccountName, ContentItem, MediaKind};

use crate::status::StatusMessage;

#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub index: usize,
    pub kind: MediaKind,
    pub preview: Option<String>,
    pub caption: String,
    pub members: usize,
    pub locked: bool,
    pub selected: bool,
    pub captioned: bool,
}

impl TileView {
    pub(crate) fn new(index: usize, item: &ContentItem, selected: Option<usize>) -> Self {
        Self {
            index,
            kind: item.kind(),
            preview: item.preview().map(|address| address.to_string()),
            caption: item.caption.clone(),
            members: item.media_addresses().len(),
            locked: item.locked,
            selected: selected == Some(index),
            captioned: item.is_captioned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionView {
    pub connected: bool,
    pub accounts: Vec<AccountName>,
    pub account: Option<AccountName>,
    pub tiles: Vec<TileView>,
    pub columns: usize,
    pub selected: Option<usize>,
    pub editing: Option<usize>,
    pub next_pending: Option<usize>,
    pub saved: bool,
    pub loading: bool,
    pub uploading: bool,
    pub upload_percent: f64,
    pub gallery_mode: bool,
    pub upload_enabled: bool,
    pub download_enabled: bool,
    pub statuses: Vec<StatusMessage>,
}

impl SessionView {
    pub fn saved_banner(&self) -> &'static str {
        if self.saved {
            "Content is saved and up-to-date"
        } else {
            "Saving"
        }
    }

    pub fn download_label(&self) -> &'static str {
        if self.selected.is_some() {
            "Download selected"
        } else {
            "Download latest and lock"
        }
    }

    /// The grid is hidden while an upload is in flight.
    pub fn grid_visible(&self) -> bool {
        self.account.is_some() && !self.uploading
    }
}
