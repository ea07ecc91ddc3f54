//! Client core of the curation tool: the content queue and its lock frontier,
//! keyboard navigation, debounced persistence, uploads and the backend client.

pub mod codec;
pub mod driver;
pub mod error;
pub mod export;
pub mod frontier;
pub mod navigation;
pub mod persistence;
pub mod queue;
pub mod session;
pub mod status;
pub mod transport;
pub mod upload;
pub mod view;

pub use driver::{spawn_session, SessionHandle};
pub use error::{BackendError, Precondition, QueueError, UploadRejection};
pub use export::{DeviceExport, DownloadRequest, MissingDeviceExport};
pub use queue::ContentQueue;
pub use session::{Command, Key, Session, SessionSettings};
pub use transport::{BackendAddress, ContentBackend, HttpContentBackend};
pub use view::{SessionView, TileView};

#[cfg(test)]
#[path = "tests/fixtures.rs"]
mod fixtures;
