use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use async_trait::async_trait;
use shared::domain::ContentItem;
use tokio::{
    sync::Mutex,
    time::{sleep, timeout},
};

use super::*;
use crate::{
    navigation::Direction,
    session::Key,
    transport::{CreateOutcome, ProgressSink, UploadReceipt},
    upload::{MediaFile, UploadProgress},
};

#[derive(Default)]
struct MemoryState {
    accounts: BTreeMap<String, Vec<ContentItem>>,
    saves: Vec<(String, Vec<ContentItem>, Instant)>,
    slow_accounts: Vec<String>,
}

#[derive(Clone, Default)]
struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    async fn with_account(self, name: &str, media: &[&str]) -> Self {
        let items = media
            .iter()
            .map(|file| ContentItem::image(format!("{name}/{file}.jpg"), format!("about {file}")))
            .collect();
        self.state.lock().await.accounts.insert(name.to_string(), items);
        self
    }

    async fn saves(&self) -> Vec<(String, Vec<ContentItem>, Instant)> {
        self.state.lock().await.saves.clone()
    }

    async fn append(&self, account: &AccountName, item: ContentItem) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let items = state
            .accounts
            .get_mut(account.as_str())
            .ok_or_else(|| not_found(account))?;
        items.push(item);
        Ok(())
    }
}

fn not_found(account: &AccountName) -> BackendError {
    BackendError::Status {
        status: 404,
        message: format!("no account {account}"),
    }
}

#[async_trait]
impl ContentBackend for MemoryBackend {
    async fn list_accounts(&self, _server: &BackendAddress) -> Result<Vec<AccountName>, BackendError> {
        let state = self.state.lock().await;
        Ok(state.accounts.keys().map(|name| AccountName::new(name.as_str())).collect())
    }

    async fn fetch_content(
        &self,
        account: &AccountName,
        _server: &BackendAddress,
    ) -> Result<Vec<ContentItem>, BackendError> {
        let slow = self
            .state
            .lock()
            .await
            .slow_accounts
            .iter()
            .any(|name| name == account.as_str());
        if slow {
            sleep(Duration::from_secs(1)).await;
        }
        self.state
            .lock()
            .await
            .accounts
            .get(account.as_str())
            .cloned()
            .ok_or_else(|| not_found(account))
    }

    async fn save_content(
        &self,
        account: &AccountName,
        items: &[ContentItem],
        _server: &BackendAddress,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.accounts.insert(account.to_string(), items.to_vec());
        state
            .saves
            .push((account.to_string(), items.to_vec(), Instant::now()));
        Ok(())
    }

    async fn create_account(
        &self,
        name: &AccountName,
        _server: &BackendAddress,
    ) -> Result<CreateOutcome, BackendError> {
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(name.as_str()) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.accounts.insert(name.to_string(), Vec::new());
        Ok(CreateOutcome::Created)
    }

    async fn delete_account(
        &self,
        account: &AccountName,
        _server: &BackendAddress,
    ) -> Result<(), BackendError> {
        self.state
            .lock()
            .await
            .accounts
            .remove(account.as_str())
            .map(drop)
            .ok_or_else(|| not_found(account))
    }

    async fn upload_single_items(
        &self,
        files: Vec<MediaFile>,
        account: &AccountName,
        _server: &BackendAddress,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, BackendError> {
        let total = files.iter().map(MediaFile::size).sum();
        let mut loaded = 0;
        for file in &files {
            loaded += file.size();
            let _ = progress.send(UploadProgress { loaded, total });
            self.append(
                account,
                ContentItem::image(format!("{account}/{}", file.name), ""),
            )
            .await?;
        }
        Ok(UploadReceipt {
            message: format!("Uploaded {} file(s)", files.len()),
        })
    }

    async fn upload_gallery(
        &self,
        _files: Vec<MediaFile>,
        _account: &AccountName,
        _server: &BackendAddress,
        _progress: ProgressSink,
    ) -> Result<UploadReceipt, BackendError> {
        Err(BackendError::Status {
            status: 500,
            message: "galleries are not supported here".into(),
        })
    }
}

#[derive(Default)]
struct RecordingExport {
    captions: Mutex<Vec<String>>,
    downloads: Mutex<Vec<String>>,
}

#[async_trait]
impl DeviceExport for RecordingExport {
    async fn copy_caption(&self, caption: &str) -> anyhow::Result<()> {
        self.captions.lock().await.push(caption.to_string());
        Ok(())
    }

    async fn download(&self, url: &str) -> anyhow::Result<PathBuf> {
        self.downloads.lock().await.push(url.to_string());
        Ok(PathBuf::from(crate::export::file_name_for(url)))
    }
}

async fn until<F>(handle: &SessionHandle, mut condition: F) -> SessionView
where
    F: FnMut(&SessionView) -> bool,
{
    let mut views = handle.subscribe();
    let view = timeout(Duration::from_secs(30), views.wait_for(|view| condition(view)))
        .await
        .expect("condition reached before timeout")
        .expect("session still running");
    view.clone()
}

async fn open_alpha(backend: &MemoryBackend, export: Arc<RecordingExport>) -> SessionHandle {
    let handle = spawn_session(Session::default(), Arc::new(backend.clone()), export);
    handle
        .send(Command::Connect {
            host: "media.test".into(),
        })
        .await
        .expect("connect");
    handle
        .send(Command::SelectAccount(Some("alpha".into())))
        .await
        .expect("select");
    until(&handle, |view| !view.loading && !view.tiles.is_empty()).await;
    handle
}

#[tokio::test(start_paused = true)]
async fn edits_in_quick_succession_produce_one_save() {
    let backend = MemoryBackend::default()
        .with_account("alpha", &["a", "b", "c", "d"])
        .await;
    let handle = open_alpha(&backend, Arc::default()).await;

    let t0 = Instant::now();
    handle.send(Command::ClickItem(0)).await.expect("click");
    for step in 0..3 {
        if step > 0 {
            sleep(Duration::from_millis(500)).await;
        }
        handle
            .send(Command::Key(Key::Arrow(Direction::Right)))
            .await
            .expect("move");
    }

    let view = until(&handle, |view| {
        view.saved
            && view.tiles[3]
                .preview
                .as_deref()
                .is_some_and(|preview| preview.ends_with("alpha/a.jpg"))
    })
    .await;
    assert_eq!(view.saved_banner(), "Content is saved and up-to-date");

    let saves = backend.saves().await;
    assert_eq!(saves.len(), 1);
    let (account, items, at) = &saves[0];
    assert_eq!(account, "alpha");
    assert!(*at >= t0 + Duration::from_millis(3000));
    assert!(*at < t0 + Duration::from_millis(3100));
    let stored: Vec<_> = items
        .iter()
        .map(|item| item.media_addresses()[0].as_str().to_string())
        .collect();
    assert_eq!(
        stored,
        ["alpha/b.jpg", "alpha/c.jpg", "alpha/d.jpg", "alpha/a.jpg"]
    );

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn download_exports_next_item_and_locks_it() {
    let backend = MemoryBackend::default()
        .with_account("alpha", &["a", "b"])
        .await;
    let export = Arc::new(RecordingExport::default());
    let handle = open_alpha(&backend, Arc::clone(&export)).await;

    handle.send(Command::Download).await.expect("download");
    let view = until(&handle, |view| view.saved && view.tiles[1].locked).await;
    assert_eq!(view.next_pending, Some(0));
    assert_eq!(*export.captions.lock().await, ["about b"]);
    assert_eq!(
        *export.downloads.lock().await,
        ["http://media.test:5001/alpha/b.jpg"]
    );

    let saves = backend.saves().await;
    assert!(saves.last().is_some_and(|(_, items, _)| items[1].locked));
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn shutdown_flushes_pending_edits() {
    let backend = MemoryBackend::default()
        .with_account("alpha", &["a", "b", "c"])
        .await;
    let handle = open_alpha(&backend, Arc::default()).await;

    handle.send(Command::ClickLock(2)).await.expect("lock");
    until(&handle, |view| !view.saved).await;
    handle.shutdown().await.expect("shutdown");

    let saves = backend.saves().await;
    assert_eq!(saves.len(), 1);
    assert!(saves[0].1[2].locked);
    assert!(!saves[0].1[1].locked);
}

#[tokio::test(start_paused = true)]
async fn late_content_for_a_previous_account_is_discarded() {
    let backend = MemoryBackend::default()
        .with_account("slow", &["old"])
        .await
        .with_account("beta", &["fresh"])
        .await;
    backend
        .state
        .lock()
        .await
        .slow_accounts
        .push("slow".to_string());

    let handle = spawn_session(
        Session::default(),
        Arc::new(backend.clone()),
        Arc::new(RecordingExport::default()),
    );
    handle
        .send(Command::Connect {
            host: "media.test".into(),
        })
        .await
        .expect("connect");
    handle
        .send(Command::SelectAccount(Some("slow".into())))
        .await
        .expect("select slow");
    handle
        .send(Command::SelectAccount(Some("beta".into())))
        .await
        .expect("select beta");

    until(&handle, |view| !view.tiles.is_empty()).await;
    sleep(Duration::from_secs(2)).await;

    let view = handle.current();
    assert_eq!(view.account.as_ref().map(AccountName::as_str), Some("beta"));
    assert_eq!(view.tiles.len(), 1);
    assert_eq!(
        view.tiles[0].preview.as_deref(),
        Some("http://media.test:5001/beta/fresh.jpg")
    );
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn creating_an_account_selects_it() {
    let backend = MemoryBackend::default()
        .with_account("alpha", &["a"])
        .await;
    let handle = spawn_session(
        Session::default(),
        Arc::new(backend.clone()),
        Arc::new(RecordingExport::default()),
    );
    handle
        .send(Command::Connect {
            host: "media.test".into(),
        })
        .await
        .expect("connect");
    handle
        .send(Command::CreateAccount("gamma".into()))
        .await
        .expect("create");

    let view = until(&handle, |view| view.account.is_some() && !view.loading).await;
    assert_eq!(view.account, Some(AccountName::new("gamma")));
    assert_eq!(
        view.accounts,
        [AccountName::new("alpha"), AccountName::new("gamma")]
    );
    assert!(view.tiles.is_empty());
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn deleting_an_account_refreshes_the_list() {
    let backend = MemoryBackend::default()
        .with_account("alpha", &["a"])
        .await
        .with_account("beta", &["b"])
        .await;
    let handle = open_alpha(&backend, Arc::default()).await;

    handle.send(Command::DeleteAccount).await.expect("delete");
    let view = until(&handle, |view| view.accounts.len() == 1).await;
    assert_eq!(view.accounts, [AccountName::new("beta")]);
    assert!(view.account.is_none());
    assert!(view.tiles.is_empty());
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn upload_refreshes_grid_with_new_items() {
    let backend = MemoryBackend::default()
        .with_account("alpha", &["a"])
        .await;
    let handle = open_alpha(&backend, Arc::default()).await;

    handle
        .send(Command::Upload(vec![
            MediaFile::new("new.png", "image/png", vec![0; 16]),
            MediaFile::new("notes.txt", "text/plain", vec![0; 4]),
        ]))
        .await
        .expect("upload");

    let view = until(&handle, |view| view.tiles.len() == 2 && !view.loading).await;
    assert!(!view.uploading);
    assert!(view.grid_visible());
    assert_eq!(view.statuses[0].text, "Uploaded 1 file(s)");
    assert_eq!(
        view.statuses[1].text,
        "Could not upload \"notes.txt\" - unsupported type"
    );
    assert_eq!(
        view.tiles[1].preview.as_deref(),
        Some("http://media.test:5001/alpha/new.png")
    );
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn failed_gallery_upload_reports_and_unlocks_ui() {
    let backend = MemoryBackend::default()
        .with_account("alpha", &["a"])
        .await;
    let handle = open_alpha(&backend, Arc::default()).await;

    handle
        .send(Command::SetGalleryMode(true))
        .await
        .expect("gallery mode");
    handle
        .send(Command::Upload(vec![
            MediaFile::new("1.jpg", "image/jpeg", vec![0; 8]),
            MediaFile::new("2.jpg", "image/jpeg", vec![0; 8]),
        ]))
        .await
        .expect("upload");

    let view = until(&handle, |view| {
        view.statuses
            .first()
            .is_some_and(|status| status.text == "Failed to upload, please try again")
    })
    .await;
    assert!(!view.uploading);
    assert!(view.upload_enabled);
    assert_eq!(view.tiles.len(), 1);
    handle.shutdown().await.expect("shutdown");
}
