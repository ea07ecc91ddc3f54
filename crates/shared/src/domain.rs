use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

name_newtype!(AccountName);
name_newtype!(MediaAddress);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Gallery,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Gallery => "gallery",
        }
    }
}

/// A member of a gallery. Members carry no caption or lock of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mediaType", rename_all = "lowercase")]
pub enum GalleryItem {
    Image {
        media: MediaAddress,
    },
    Video {
        media: MediaAddress,
        thumbnail: MediaAddress,
    },
}

impl GalleryItem {
    pub fn media(&self) -> &MediaAddress {
        match self {
            GalleryItem::Image { media } | GalleryItem::Video { media, .. } => media,
        }
    }

    /// Address a renderer should paint for this member.
    pub fn preview(&self) -> &MediaAddress {
        match self {
            GalleryItem::Image { media } => media,
            GalleryItem::Video { thumbnail, .. } => thumbnail,
        }
    }
}

/// Payload of a queue entry, discriminated on the wire by `mediaType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mediaType", rename_all = "lowercase")]
pub enum Media {
    Image {
        media: MediaAddress,
    },
    Video {
        media: MediaAddress,
        thumbnail: MediaAddress,
    },
    Gallery {
        media: Vec<GalleryItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(flatten)]
    pub media: Media,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub locked: bool,
}

impl ContentItem {
    pub fn image(media: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            media: Media::Image {
                media: MediaAddress::new(media),
            },
            caption: caption.into(),
            locked: false,
        }
    }

    pub fn video(
        media: impl Into<String>,
        thumbnail: impl Into<String>,
        caption: impl Into<String>,
    ) -> Self {
        Self {
            media: Media::Video {
                media: MediaAddress::new(media),
                thumbnail: MediaAddress::new(thumbnail),
            },
            caption: caption.into(),
            locked: false,
        }
    }

    pub fn gallery(members: Vec<GalleryItem>, caption: impl Into<String>) -> Self {
        Self {
            media: Media::Gallery { media: members },
            caption: caption.into(),
            locked: false,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self.media {
            Media::Image { .. } => MediaKind::Image,
            Media::Video { .. } => MediaKind::Video,
            Media::Gallery { .. } => MediaKind::Gallery,
        }
    }

    pub fn is_captioned(&self) -> bool {
        !self.caption.is_empty()
    }

    /// Address shown on the grid tile: thumbnails for videos, the head member for galleries.
    pub fn preview(&self) -> Option<&MediaAddress> {
        match &self.media {
            Media::Image { media } => Some(media),
            Media::Video { thumbnail, .. } => Some(thumbnail),
            Media::Gallery { media } => media.first().map(GalleryItem::preview),
        }
    }

    /// Every downloadable media file of the item, in gallery order.
    pub fn media_addresses(&self) -> Vec<&MediaAddress> {
        match &self.media {
            Media::Image { media } | Media::Video { media, .. } => vec![media],
            Media::Gallery { media } => media.iter().map(GalleryItem::media).collect(),
        }
    }
}
