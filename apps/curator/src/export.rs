use std::path::PathBuf;

use anyhow::{Context, Result};
use arboard::Clipboard;
use async_trait::async_trait;
use client_core::{export::file_name_for, DeviceExport};
use reqwest::Client;
use tracing::{info, warn};

/// Writes downloads into a local directory and captions to the system clipboard.
pub struct CliExport {
    http: Client,
    out_dir: PathBuf,
}

impl CliExport {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            http: Client::new(),
            out_dir,
        }
    }
}

#[async_trait]
impl DeviceExport for CliExport {
    async fn copy_caption(&self, caption: &str) -> Result<()> {
        let text = caption.to_string();
        let copied = tokio::task::spawn_blocking(move || -> Result<(), String> {
            let mut clipboard = Clipboard::new().map_err(|err| err.to_string())?;
            clipboard.set_text(text).map_err(|err| err.to_string())
        })
        .await
        .context("clipboard task panicked")?;

        // No clipboard in headless sessions.
        if let Err(err) = copied {
            warn!(%err, "clipboard unavailable, printing caption instead");
            println!("caption: {caption}");
        }
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("failed to create '{}'", self.out_dir.display()))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("media host refused {url}"))?;
        let bytes = response.bytes().await?;

        let path = self.out_dir.join(file_name_for(url));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "media downloaded");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
