use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{AccountName, ContentItem};

const KNOWN_MEDIA_TYPES: [&str; 3] = ["image", "video", "gallery"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub username: AccountName,
}

/// An entry of a fetched queue carried a `mediaType` tag (top level or inside a
/// gallery) that is not one of the recognised variants, or lacked required fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed media at index {index} (mediaType {media_type:?}): {reason}")]
pub struct MalformedMediaError {
    pub index: usize,
    pub media_type: Option<String>,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ContentDecodeError {
    #[error("content payload is not a JSON array: {0}")]
    NotAnArray(#[source] serde_json::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedMediaError),
}

/// Decodes a queue body element by element so an unknown variant is reported
/// with its position instead of being silently dropped.
pub fn decode_content(body: &[u8]) -> Result<Vec<ContentItem>, ContentDecodeError> {
    let raw: Vec<Value> = serde_json::from_slice(body).map_err(ContentDecodeError::NotAnArray)?;
    raw.into_iter()
        .enumerate()
        .map(|(index, value)| decode_item(index, value).map_err(ContentDecodeError::from))
        .collect()
}

pub fn decode_item(index: usize, value: Value) -> Result<ContentItem, MalformedMediaError> {
    let media_type = value
        .get("mediaType")
        .and_then(Value::as_str)
        .map(str::to_string);

    match media_type.as_deref() {
        Some(tag) if KNOWN_MEDIA_TYPES.contains(&tag) => {}
        Some(_) => {
            return Err(MalformedMediaError {
                index,
                media_type,
                reason: "unknown media type".to_string(),
            })
        }
        None => {
            return Err(MalformedMediaError {
                index,
                media_type,
                reason: "missing mediaType".to_string(),
            })
        }
    }

    serde_json::from_value(value).map_err(|err| MalformedMediaError {
        index,
        media_type,
        reason: err.to_string(),
    })
}

pub fn encode_content(items: &[ContentItem]) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(items)
}
