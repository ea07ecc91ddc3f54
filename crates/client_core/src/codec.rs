//! Rewrites media addresses between the storage-relative form the backend keeps
//! and the host-qualified form used for display and download.

use shared::domain::{ContentItem, GalleryItem, Media, MediaAddress};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAddressCodec {
    prefix: String,
}

impl MediaAddressCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Prefix for a media host URL, always ending in a single `/`.
    pub fn for_host(media_host: &Url) -> Self {
        let mut prefix = media_host.as_str().trim_end_matches('/').to_string();
        prefix.push('/');
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn format(&self, items: &[ContentItem]) -> Vec<ContentItem> {
        items
            .iter()
            .map(|item| rewrite(item, |address| self.format_address(address)))
            .collect()
    }

    /// Exact inverse of [`format`](Self::format).
    pub fn strip(&self, items: &[ContentItem]) -> Vec<ContentItem> {
        items
            .iter()
            .map(|item| rewrite(item, |address| self.strip_address(address)))
            .collect()
    }

    pub fn format_address(&self, address: &MediaAddress) -> MediaAddress {
        MediaAddress(format!("{}{}", self.prefix, address.0))
    }

    /// Removes one leading prefix. Addresses without it pass through untouched.
    pub fn strip_address(&self, address: &MediaAddress) -> MediaAddress {
        match address.0.strip_prefix(&self.prefix) {
            Some(rest) => MediaAddress(rest.to_string()),
            None => address.clone(),
        }
    }
}

fn rewrite(item: &ContentItem, f: impl Fn(&MediaAddress) -> MediaAddress) -> ContentItem {
    let media = match &item.media {
        Media::Image { media } => Media::Image { media: f(media) },
        Media::Video { media, thumbnail } => Media::Video {
            media: f(media),
            thumbnail: f(thumbnail),
        },
        Media::Gallery { media } => Media::Gallery {
            media: media
                .iter()
                .map(|member| match member {
                    GalleryItem::Image { media } => GalleryItem::Image { media: f(media) },
                    GalleryItem::Video { media, thumbnail } => GalleryItem::Video {
                        media: f(media),
                        thumbnail: f(thumbnail),
                    },
                })
                .collect(),
        },
    };

    ContentItem {
        media,
        caption: item.caption.clone(),
        locked: item.locked,
    }
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
