use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use client_core::upload::MediaFile;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Reads a local file for upload. The MIME type is guessed from the extension.
pub async fn read_media_file(path: &Path) -> Result<MediaFile> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME_TYPE);
    Ok(MediaFile::new(name, mime_type, bytes))
}

pub async fn read_media_files(paths: &[PathBuf]) -> Result<Vec<MediaFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_media_file(path).await?);
    }
    Ok(files)
}
