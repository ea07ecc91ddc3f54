//! Device side effects of a download: clipboard and local files.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub index: usize,
    pub caption: String,
    /// Host-qualified addresses of every media file of the item.
    pub urls: Vec<String>,
    pub lock_after: bool,
}

#[async_trait]
pub trait DeviceExport: Send + Sync {
    async fn copy_caption(&self, caption: &str) -> Result<()>;
    async fn download(&self, url: &str) -> Result<PathBuf>;
}

pub struct MissingDeviceExport;

#[async_trait]
impl DeviceExport for MissingDeviceExport {
    async fn copy_caption(&self, _caption: &str) -> Result<()> {
        Err(anyhow!("clipboard is unavailable"))
    }

    async fn download(&self, url: &str) -> Result<PathBuf> {
        Err(anyhow!("no download target configured for {url}"))
    }
}

/// Copies the caption, then fetches every file. Stops at the first failure.
pub async fn export_item(export: &dyn DeviceExport, request: &DownloadRequest) -> Result<Vec<PathBuf>> {
    export.copy_caption(&request.caption).await?;
    let mut written = Vec::with_capacity(request.urls.len());
    for url in &request.urls {
        written.push(export.download(url).await?);
    }
    Ok(written)
}

/// File name a download of `url` is stored under: the last path segment.
pub fn file_name_for(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|name| !name.is_empty()).unwrap_or("download")
}
