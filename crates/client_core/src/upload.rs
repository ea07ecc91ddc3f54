//! Classification and planning of user-selected files before they hit the backend.

use shared::domain::AccountName;

use crate::error::{Precondition, UploadRejection};

pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "video/mp4"];
pub const MAX_GALLERY_ITEMS: usize = 10;

#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl std::fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub allowed_mime_types: Vec<String>,
    pub max_gallery_items: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_gallery_items: MAX_GALLERY_ITEMS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// Every file becomes its own queue item, sent as one batch.
    Singles(Vec<MediaFile>),
    /// All files become one new gallery item.
    Gallery(Vec<MediaFile>),
}

impl UploadPlan {
    pub fn files(&self) -> &[MediaFile] {
        match self {
            UploadPlan::Singles(files) | UploadPlan::Gallery(files) => files,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files().iter().map(MediaFile::size).sum()
    }
}

/// Session state an upload request is checked against.
#[derive(Debug, Clone, Copy)]
pub struct UploadContext<'a> {
    pub account: Option<&'a AccountName>,
    pub saved: bool,
    pub uploading: bool,
    pub editing: bool,
    pub gallery_mode: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct UploadDecision {
    /// One entry per refused file or refused batch, in reporting order.
    pub rejections: Vec<UploadRejection>,
    pub plan: Option<UploadPlan>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadCoordinator {
    policy: UploadPolicy,
}

impl UploadCoordinator {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn is_allowed(&self, mime_type: &str) -> bool {
        self.policy
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }

    pub fn partition(&self, files: Vec<MediaFile>) -> (Vec<MediaFile>, Vec<UploadRejection>) {
        let (valid, rejected): (Vec<_>, Vec<_>) = files
            .into_iter()
            .partition(|file| self.is_allowed(&file.mime_type));
        let rejected = rejected
            .into_iter()
            .map(|file| UploadRejection::UnsupportedFileType {
                name: file.name,
                mime_type: file.mime_type,
            })
            .collect();
        (valid, rejected)
    }

    pub fn plan(&self, files: Vec<MediaFile>, context: UploadContext<'_>) -> UploadDecision {
        let (valid, mut rejections) = self.partition(files);

        if let Some(precondition) = unmet_precondition(&context) {
            rejections.push(UploadRejection::PreconditionViolation(precondition));
            return UploadDecision {
                rejections,
                plan: None,
            };
        }

        if valid.is_empty() {
            return UploadDecision {
                rejections,
                plan: None,
            };
        }

        if context.gallery_mode && valid.len() > 1 {
            if valid.len() > self.policy.max_gallery_items {
                rejections.push(UploadRejection::GalleryTooLarge {
                    max: self.policy.max_gallery_items,
                    requested: valid.len(),
                });
                return UploadDecision {
                    rejections,
                    plan: None,
                };
            }
            return UploadDecision {
                rejections,
                plan: Some(UploadPlan::Gallery(valid)),
            };
        }

        UploadDecision {
            rejections,
            plan: Some(UploadPlan::Singles(valid)),
        }
    }
}

fn unmet_precondition(context: &UploadContext<'_>) -> Option<Precondition> {
    if context.account.is_none() {
        Some(Precondition::NoAccount)
    } else if !context.saved {
        Some(Precondition::UnsavedChanges)
    } else if context.uploading {
        Some(Precondition::Uploading)
    } else if context.editing {
        Some(Precondition::Editing)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.loaded.min(self.total) as f64 / self.total as f64) * 100.0
    }
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
