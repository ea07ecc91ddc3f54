use thiserror::Error;

pub use shared::protocol::MalformedMediaError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("index {index} is out of range for a queue of {len} items")]
    OutOfRange { index: usize, len: usize },
    #[error("item {index} is not a gallery")]
    NotAGallery { index: usize },
    #[error("gallery at {index} has no member {member} (it holds {size})")]
    GalleryMemberOutOfRange {
        index: usize,
        member: usize,
        size: usize,
    },
}

/// Why an action was refused before any side effect happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    NotConnected,
    NoAccount,
    UnsavedChanges,
    Uploading,
    Editing,
}

impl Precondition {
    pub fn describe(self) -> &'static str {
        match self {
            Precondition::NotConnected => "no backend connected",
            Precondition::NoAccount => "no account selected",
            Precondition::UnsavedChanges => "edits are still being saved",
            Precondition::Uploading => "an upload is in progress",
            Precondition::Editing => "an item is being edited",
        }
    }
}

/// Upload refusals. `Display` is the status text shown to the curator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Could not upload \"{name}\" - unsupported type")]
    UnsupportedFileType { name: String, mime_type: String },
    #[error("Something went wrong, please try again")]
    PreconditionViolation(Precondition),
    #[error("Cannot create gallery of more than {max} items")]
    GalleryTooLarge { max: usize, requested: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid backend response: {0}")]
    Decode(String),
    #[error(transparent)]
    Malformed(#[from] MalformedMediaError),
}

impl From<reqwest::Error> for BackendError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            BackendError::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            BackendError::Status {
                status: status.as_u16(),
                message: value.to_string(),
            }
        } else {
            BackendError::Transport(value.to_string())
        }
    }
}
