//! Backend collaborator boundary.
//!
//! Every address crossing this boundary is storage-relative; callers strip
//! host prefixes before saving.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use anyhow::Context;
use async_trait::async_trait;
use futures::stream;
use reqwest::{multipart, Body, Client, Response, StatusCode};
use shared::{
    domain::{AccountName, ContentItem},
    error::ApiError,
    protocol::{decode_content, ContentDecodeError, CreateAccountRequest},
};
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

use crate::{
    error::BackendError,
    upload::{MediaFile, UploadProgress},
};

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// API and media host of one backend deployment. The media host listens one
/// port above the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddress {
    pub api: Url,
    pub media: Url,
}

impl BackendAddress {
    pub fn new(api: Url, media: Url) -> Self {
        Self { api, media }
    }

    pub fn from_host(host: &str, port_base: u16) -> anyhow::Result<Self> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            anyhow::bail!("backend host must not be empty");
        }
        let base = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };
        let media_port = port_base
            .checked_add(1)
            .context("port base leaves no room for the media host")?;

        let mut api = Url::parse(&base).with_context(|| format!("invalid backend host '{host}'"))?;
        let mut media = api.clone();
        api.set_port(Some(port_base))
            .map_err(|()| anyhow::anyhow!("backend host '{host}' cannot carry a port"))?;
        media
            .set_port(Some(media_port))
            .map_err(|()| anyhow::anyhow!("backend host '{host}' cannot carry a port"))?;
        Ok(Self { api, media })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.api.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Transport(format!("{} cannot be a base", self.api)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Server-supplied confirmation shown to the curator.
    pub message: String,
}

pub type ProgressSink = mpsc::UnboundedSender<UploadProgress>;

#[async_trait]
pub trait ContentBackend: Send + Sync {
    async fn list_accounts(&self, server: &BackendAddress) -> Result<Vec<AccountName>, BackendError>;
    async fn fetch_content(
        &self,
        account: &AccountName,
        server: &BackendAddress,
    ) -> Result<Vec<ContentItem>, BackendError>;
    /// Idempotent overwrite of the account's whole queue.
    async fn save_content(
        &self,
        account: &AccountName,
        items: &[ContentItem],
        server: &BackendAddress,
    ) -> Result<(), BackendError>;
    async fn create_account(
        &self,
        name: &AccountName,
        server: &BackendAddress,
    ) -> Result<CreateOutcome, BackendError>;
    async fn delete_account(
        &self,
        account: &AccountName,
        server: &BackendAddress,
    ) -> Result<(), BackendError>;
    async fn upload_single_items(
        &self,
        files: Vec<MediaFile>,
        account: &AccountName,
        server: &BackendAddress,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, BackendError>;
    async fn upload_gallery(
        &self,
        files: Vec<MediaFile>,
        account: &AccountName,
        server: &BackendAddress,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, BackendError>;
}

/// JSON over HTTP implementation of [`ContentBackend`].
///
/// Routes, relative to the API address:
/// `GET /accounts`, `POST /accounts`, `DELETE /accounts/{name}`,
/// `GET|PUT /accounts/{name}/content`, `POST /accounts/{name}/media`,
/// `POST /accounts/{name}/gallery` (multipart, one `files` part per file).
#[derive(Clone, Default)]
pub struct HttpContentBackend {
    http: Client,
}

impl HttpContentBackend {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    async fn upload(
        &self,
        route: &str,
        files: Vec<MediaFile>,
        account: &AccountName,
        server: &BackendAddress,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, BackendError> {
        let url = server.endpoint(&["accounts", account.as_str(), route])?;
        let counter = Arc::new(ProgressCounter::new(
            files.iter().map(MediaFile::size).sum(),
            progress,
        ));
        counter.publish();

        let mut form = multipart::Form::new();
        for file in files {
            form = form.part("files", progress_part(file, Arc::clone(&counter))?);
        }

        info!(%account, route, total = counter.total, "uploading media");
        let response = self.http.post(url).multipart(form).send().await?;
        let response = ensure_success(response).await?;
        let message = response.text().await?;
        Ok(UploadReceipt { message })
    }
}

#[async_trait]
impl ContentBackend for HttpContentBackend {
    async fn list_accounts(&self, server: &BackendAddress) -> Result<Vec<AccountName>, BackendError> {
        let response = self
            .http
            .get(server.endpoint(&["accounts"])?)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn fetch_content(
        &self,
        account: &AccountName,
        server: &BackendAddress,
    ) -> Result<Vec<ContentItem>, BackendError> {
        let response = self
            .http
            .get(server.endpoint(&["accounts", account.as_str(), "content"])?)
            .send()
            .await?;
        let body = ensure_success(response).await?.bytes().await?;
        decode_content(&body).map_err(|err| match err {
            ContentDecodeError::Malformed(err) => BackendError::Malformed(err),
            other => BackendError::Decode(other.to_string()),
        })
    }

    async fn save_content(
        &self,
        account: &AccountName,
        items: &[ContentItem],
        server: &BackendAddress,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .put(server.endpoint(&["accounts", account.as_str(), "content"])?)
            .json(items)
            .send()
            .await?;
        ensure_success(response).await?;
        debug!(%account, items = items.len(), "content saved");
        Ok(())
    }

    async fn create_account(
        &self,
        name: &AccountName,
        server: &BackendAddress,
    ) -> Result<CreateOutcome, BackendError> {
        let response = self
            .http
            .post(server.endpoint(&["accounts"])?)
            .json(&CreateAccountRequest {
                username: name.clone(),
            })
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(CreateOutcome::AlreadyExists);
        }
        ensure_success(response).await?;
        Ok(CreateOutcome::Created)
    }

    async fn delete_account(
        &self,
        account: &AccountName,
        server: &BackendAddress,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .delete(server.endpoint(&["accounts", account.as_str()])?)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn upload_single_items(
        &self,
        files: Vec<MediaFile>,
        account: &AccountName,
        server: &BackendAddress,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, BackendError> {
        self.upload("media", files, account, server, progress).await
    }

    async fn upload_gallery(
        &self,
        files: Vec<MediaFile>,
        account: &AccountName,
        server: &BackendAddress,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, BackendError> {
        self.upload("gallery", files, account, server, progress).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let api_error = ApiError::from_response(status.as_u16(), &body);
    Err(BackendError::Status {
        status: status.as_u16(),
        message: api_error.message,
    })
}

struct ProgressCounter {
    loaded: AtomicU64,
    total: u64,
    sink: ProgressSink,
}

impl ProgressCounter {
    fn new(total: u64, sink: ProgressSink) -> Self {
        Self {
            loaded: AtomicU64::new(0),
            total,
            sink,
        }
    }

    fn advance(&self, bytes: usize) {
        self.loaded.fetch_add(bytes as u64, Ordering::Relaxed);
        self.publish();
    }

    fn publish(&self) {
        let _ = self.sink.send(UploadProgress {
            loaded: self.loaded.load(Ordering::Relaxed),
            total: self.total,
        });
    }
}

fn progress_part(
    file: MediaFile,
    counter: Arc<ProgressCounter>,
) -> Result<multipart::Part, BackendError> {
    let length = file.size();
    let chunks: Vec<Vec<u8>> = file
        .bytes
        .chunks(UPLOAD_CHUNK_BYTES)
        .map(<[u8]>::to_vec)
        .collect();
    let body = Body::wrap_stream(stream::iter(chunks.into_iter().map(move |chunk| {
        counter.advance(chunk.len());
        Ok::<_, std::io::Error>(chunk)
    })));

    multipart::Part::stream_with_length(body, length)
        .file_name(file.name)
        .mime_str(&file.mime_type)
        .map_err(|err| BackendError::Transport(format!("invalid mime type: {err}")))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
