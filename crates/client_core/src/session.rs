//! The active curation session.
//!
//! `Session` is a synchronous reducer: input commands and I/O completions go in,
//! I/O requests (`Effect`s) come out. It never touches the network itself, so
//! every policy here is testable without a runtime. The driver executes effects
//! and feeds their results back as `Completion`s tagged with the epoch they were
//! issued under; completions from an earlier epoch are dropped.

use shared::domain::{AccountName, ContentItem};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{
    codec::MediaAddressCodec,
    error::{BackendError, Precondition},
    export::DownloadRequest,
    navigation::{Direction, NavigationController, DEFAULT_GRID_COLUMNS},
    persistence::{PersistenceScheduler, DEFAULT_SAVE_DELAY, DEFAULT_SAVE_GUARD},
    queue::ContentQueue,
    status::StatusBoard,
    transport::{BackendAddress, CreateOutcome, UploadReceipt},
    upload::{MediaFile, UploadContext, UploadCoordinator, UploadPlan, UploadPolicy, UploadProgress},
    view::{SessionView, TileView},
};

pub const DEFAULT_PORT_BASE: u16 = 5000;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub grid_columns: usize,
    pub port_base: u16,
    pub save_delay: Duration,
    pub save_guard: Duration,
    pub upload_policy: UploadPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            grid_columns: DEFAULT_GRID_COLUMNS,
            port_base: DEFAULT_PORT_BASE,
            save_delay: DEFAULT_SAVE_DELAY,
            save_guard: DEFAULT_SAVE_GUARD,
            upload_policy: UploadPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Arrow(Direction),
    Escape,
}

#[derive(Debug, Clone)]
pub enum Command {
    Connect { host: String },
    /// `None` selects no account and clears the grid.
    SelectAccount(Option<AccountName>),
    CreateAccount(String),
    DeleteAccount,
    Key(Key),
    ClickItem(usize),
    ClickLock(usize),
    BeginEdit(usize),
    CloseEditor,
    SaveCaption(String),
    DeleteEditedItem,
    PromoteGalleryItem(usize),
    SetGalleryMode(bool),
    Upload(Vec<MediaFile>),
    /// Downloads the selected item, or the next pending one and locks it.
    Download,
    DismissStatus(usize),
}

#[derive(Debug)]
pub enum Effect {
    ListAccounts {
        connection: u64,
        server: BackendAddress,
    },
    FetchContent {
        epoch: u64,
        account: AccountName,
        server: BackendAddress,
    },
    SaveContent {
        epoch: u64,
        revision: u64,
        account: AccountName,
        items: Vec<ContentItem>,
        server: BackendAddress,
    },
    /// Create, then list, then fetch: strictly in that order.
    CreateAccount {
        epoch: u64,
        name: AccountName,
        server: BackendAddress,
    },
    /// Delete, then list.
    DeleteAccount {
        epoch: u64,
        account: AccountName,
        server: BackendAddress,
    },
    Upload {
        epoch: u64,
        account: AccountName,
        server: BackendAddress,
        plan: UploadPlan,
    },
    Export(DownloadRequest),
}

#[derive(Debug)]
pub struct CreatedAccount {
    pub outcome: CreateOutcome,
    pub accounts: Vec<AccountName>,
    pub items: Vec<ContentItem>,
}

#[derive(Debug)]
pub enum Completion {
    AccountsListed {
        connection: u64,
        result: Result<Vec<AccountName>, BackendError>,
    },
    ContentFetched {
        epoch: u64,
        account: AccountName,
        result: Result<Vec<ContentItem>, BackendError>,
    },
    ContentSaved {
        epoch: u64,
        revision: u64,
        account: AccountName,
        result: Result<(), BackendError>,
    },
    AccountCreated {
        epoch: u64,
        name: AccountName,
        result: Result<CreatedAccount, BackendError>,
    },
    AccountDeleted {
        epoch: u64,
        account: AccountName,
        result: Result<Vec<AccountName>, BackendError>,
    },
    UploadProgressed {
        epoch: u64,
        progress: UploadProgress,
    },
    UploadFinished {
        epoch: u64,
        result: Result<UploadReceipt, BackendError>,
    },
    ExportFinished {
        index: usize,
        lock_after: bool,
        result: Result<usize, String>,
    },
}

#[derive(Debug, Clone)]
struct Connection {
    server: BackendAddress,
    codec: MediaAddressCodec,
}

#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    connection: Option<Connection>,
    connection_id: u64,
    epoch: u64,
    accounts: Vec<AccountName>,
    account: Option<AccountName>,
    queue: ContentQueue,
    navigation: NavigationController,
    persistence: PersistenceScheduler,
    uploads: UploadCoordinator,
    status: StatusBoard,
    gallery_mode: bool,
    loading: bool,
    uploading: bool,
    upload_percent: f64,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            navigation: NavigationController::new(settings.grid_columns),
            persistence: PersistenceScheduler::new(settings.save_delay, settings.save_guard),
            uploads: UploadCoordinator::new(settings.upload_policy.clone()),
            settings,
            connection: None,
            connection_id: 0,
            epoch: 0,
            accounts: Vec::new(),
            account: None,
            queue: ContentQueue::default(),
            status: StatusBoard::default(),
            gallery_mode: false,
            loading: false,
            uploading: false,
            upload_percent: 0.0,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn queue(&self) -> &ContentQueue {
        &self.queue
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn account(&self) -> Option<&AccountName> {
        self.account.as_ref()
    }

    pub fn accounts(&self) -> &[AccountName] {
        &self.accounts
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_saved(&self) -> bool {
        self.persistence.is_saved()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn upload_percent(&self) -> f64 {
        self.upload_percent
    }

    pub fn next_save_check(&self) -> Option<Instant> {
        self.persistence.next_check()
    }

    pub fn handle(&mut self, command: Command, now: Instant) -> Vec<Effect> {
        debug!(?command, "session command");
        match command {
            Command::Connect { host } => self.connect(&host),
            Command::SelectAccount(account) => self.select_account(account),
            Command::CreateAccount(name) => self.create_account(&name),
            Command::DeleteAccount => self.delete_account(),
            Command::Key(Key::Escape) => {
                self.navigation.escape();
                Vec::new()
            }
            Command::Key(Key::Arrow(direction)) => {
                if self.grid_interactive()
                    && self
                        .navigation
                        .move_selection(&mut self.queue, direction)
                        .is_some()
                {
                    self.persistence.record_edit(now);
                }
                Vec::new()
            }
            Command::ClickItem(index) => {
                if self.grid_interactive() {
                    self.navigation.click(&self.queue, index);
                }
                Vec::new()
            }
            Command::ClickLock(index) => {
                self.click_lock(index, now);
                Vec::new()
            }
            Command::BeginEdit(index) => {
                if self.grid_interactive() {
                    self.navigation.begin_edit(&self.queue, index);
                }
                Vec::new()
            }
            Command::CloseEditor => {
                self.navigation.end_edit();
                Vec::new()
            }
            Command::SaveCaption(text) => {
                self.edit_current(now, |queue, index| queue.set_caption(index, text));
                Vec::new()
            }
            Command::DeleteEditedItem => {
                if self.edit_current(now, |queue, index| queue.remove(index).map(drop)) {
                    self.navigation.end_edit();
                }
                Vec::new()
            }
            Command::PromoteGalleryItem(member) => {
                self.edit_current(now, |queue, index| queue.promote_gallery_item(index, member));
                Vec::new()
            }
            Command::SetGalleryMode(enabled) => {
                self.gallery_mode = enabled;
                Vec::new()
            }
            Command::Upload(files) => self.upload(files),
            Command::Download => self.download(now),
            Command::DismissStatus(position) => {
                self.status.dismiss(position);
                Vec::new()
            }
        }
    }

    /// Called when a scheduled debounce check comes due.
    pub fn on_save_check(&mut self, now: Instant) -> Vec<Effect> {
        if !self.persistence.fire_due_checks(now) {
            return Vec::new();
        }
        self.save_effect().into_iter().collect()
    }

    /// Save of the current state regardless of the debounce window, if anything is unsaved.
    pub fn flush(&mut self) -> Option<Effect> {
        if self.persistence.is_saved() {
            return None;
        }
        self.save_effect()
    }

    pub fn complete(&mut self, completion: Completion, now: Instant) -> Vec<Effect> {
        match completion {
            Completion::AccountsListed { connection, result } => {
                if connection != self.connection_id {
                    debug!(connection, current = self.connection_id, "dropping stale account list");
                    return Vec::new();
                }
                match result {
                    Ok(accounts) => self.accounts = accounts,
                    Err(err) => self.status.failure(format!("Could not list accounts: {err}")),
                }
                Vec::new()
            }
            Completion::ContentFetched {
                epoch,
                account,
                result,
            } => {
                if self.is_stale(epoch, "content fetch") {
                    return Vec::new();
                }
                self.loading = false;
                match result {
                    Ok(items) => {
                        info!(%account, items = items.len(), "content loaded");
                        self.replace_queue(&items);
                    }
                    Err(err) => self.report_fetch_failure(&account, &err),
                }
                Vec::new()
            }
            Completion::ContentSaved {
                epoch,
                revision,
                account,
                result,
            } => {
                // The queue of a previous epoch is gone, so its failures are only reported.
                if epoch != self.epoch {
                    if let Err(err) = result {
                        warn!(%account, %err, revision, "save of a previous account failed");
                        self.status
                            .failure(format!("Could not save content of \"{account}\": {err}"));
                    } else {
                        debug!(%account, revision, "previous account saved");
                    }
                    return Vec::new();
                }
                match result {
                    Ok(()) => {
                        let saved = self.persistence.mark_saved(revision, self.queue.revision());
                        debug!(revision, saved, "save acknowledged");
                    }
                    Err(err) => {
                        warn!(%err, revision, "save failed; retrying after the debounce delay");
                        self.status
                            .failure(format!("Could not save content of \"{account}\": {err}"));
                        self.persistence.retry(now);
                    }
                }
                Vec::new()
            }
            Completion::AccountCreated {
                epoch,
                name,
                result,
            } => {
                if self.is_stale(epoch, "account creation") {
                    return Vec::new();
                }
                self.loading = false;
                match result {
                    Ok(created) => {
                        info!(account = %name, outcome = ?created.outcome, "account ready");
                        self.accounts = created.accounts;
                        self.account = Some(name);
                        self.replace_queue(&created.items);
                    }
                    Err(err) => self
                        .status
                        .failure(format!("Could not create account \"{name}\": {err}")),
                }
                Vec::new()
            }
            Completion::AccountDeleted {
                epoch,
                account,
                result,
            } => {
                if self.is_stale(epoch, "account deletion") {
                    return Vec::new();
                }
                self.loading = false;
                match result {
                    Ok(accounts) => {
                        // Nothing is flushed: the account's queue no longer exists.
                        self.leave_account(false);
                        self.accounts = accounts;
                        self.status.success(format!("Deleted account \"{account}\""));
                    }
                    Err(err) => {
                        warn!(%account, %err, "account deletion failed");
                        self.status
                            .failure(format!("Could not delete account \"{account}\": {err}"));
                    }
                }
                Vec::new()
            }
            Completion::UploadProgressed { epoch, progress } => {
                if epoch == self.epoch && self.uploading {
                    self.upload_percent = progress.percent();
                }
                Vec::new()
            }
            Completion::UploadFinished { epoch, result } => {
                // Cleared even when the upload is stale.
                self.uploading = false;
                if self.is_stale(epoch, "upload") {
                    return Vec::new();
                }
                match result {
                    Ok(receipt) => {
                        self.upload_percent = 100.0;
                        self.status.success(receipt.message);
                        self.refetch().into_iter().collect()
                    }
                    Err(err) => {
                        warn!(%err, "upload failed");
                        self.status.failure("Failed to upload, please try again");
                        Vec::new()
                    }
                }
            }
            Completion::ExportFinished {
                index,
                lock_after,
                result,
            } => {
                match result {
                    Ok(files) => {
                        debug!(index, files, "item exported");
                        self.status.success(if lock_after {
                            "Downloaded item, copied caption to clipboard and locked item"
                        } else {
                            "Downloaded item and copied caption to clipboard"
                        });
                    }
                    Err(err) => self
                        .status
                        .failure(format!("Could not export item {index}: {err}")),
                }
                Vec::new()
            }
        }
    }

    pub fn view(&self) -> SessionView {
        let selected = self.navigation.selected();
        let editing = self.navigation.is_editing();
        SessionView {
            connected: self.connection.is_some(),
            accounts: self.accounts.clone(),
            account: self.account.clone(),
            tiles: self
                .queue
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| TileView::new(index, item, selected))
                .collect(),
            columns: self.navigation.columns(),
            selected,
            editing: self.navigation.editing(),
            next_pending: self.queue.next_pending_index(),
            saved: self.persistence.is_saved(),
            loading: self.loading,
            uploading: self.uploading,
            upload_percent: self.upload_percent,
            gallery_mode: self.gallery_mode,
            upload_enabled: self.account.is_some()
                && self.persistence.is_saved()
                && !self.loading
                && !self.uploading
                && !editing,
            download_enabled: self.account.is_some() && !self.uploading && !editing,
            statuses: self.status.messages().to_vec(),
        }
    }

    fn connect(&mut self, host: &str) -> Vec<Effect> {
        if let Some(precondition) = self.busy() {
            self.refuse("connect", precondition);
            return Vec::new();
        }
        let server = match BackendAddress::from_host(host, self.settings.port_base) {
            Ok(server) => server,
            Err(err) => {
                self.status.failure(format!("Invalid backend address: {err:#}"));
                return Vec::new();
            }
        };

        let mut effects = self.leave_account(true);
        info!(api = %server.api, media = %server.media, "connecting to backend");
        self.accounts.clear();
        self.connection_id += 1;
        self.connection = Some(Connection {
            codec: MediaAddressCodec::for_host(&server.media),
            server: server.clone(),
        });
        effects.push(Effect::ListAccounts {
            connection: self.connection_id,
            server,
        });
        effects
    }

    fn select_account(&mut self, account: Option<AccountName>) -> Vec<Effect> {
        if let Some(precondition) = self.busy() {
            self.refuse("switch accounts", precondition);
            return Vec::new();
        }
        let Some(account) = account else {
            return self.leave_account(true);
        };
        let Some(server) = self.server() else {
            self.refuse("select an account", Precondition::NotConnected);
            return Vec::new();
        };

        let mut effects = self.leave_account(true);
        info!(%account, epoch = self.epoch, "selecting account");
        self.account = Some(account.clone());
        self.loading = true;
        effects.push(Effect::FetchContent {
            epoch: self.epoch,
            account,
            server,
        });
        effects
    }

    fn create_account(&mut self, raw: &str) -> Vec<Effect> {
        let name = raw.trim();
        if name.is_empty() {
            return Vec::new();
        }
        if let Some(precondition) = self.busy() {
            self.refuse("create an account", precondition);
            return Vec::new();
        }
        let Some(server) = self.server() else {
            self.refuse("create an account", Precondition::NotConnected);
            return Vec::new();
        };

        let mut effects = self.leave_account(true);
        self.loading = true;
        effects.push(Effect::CreateAccount {
            epoch: self.epoch,
            name: AccountName::new(name),
            server,
        });
        effects
    }

    fn delete_account(&mut self) -> Vec<Effect> {
        if let Some(precondition) = self.busy() {
            self.refuse("delete the account", precondition);
            return Vec::new();
        }
        let (Some(server), Some(account)) = (self.server(), self.account.clone()) else {
            self.refuse("delete the account", Precondition::NoAccount);
            return Vec::new();
        };

        // The account stays open until the backend confirms.
        info!(%account, "deleting account");
        self.navigation.deselect();
        self.loading = true;
        vec![Effect::DeleteAccount {
            epoch: self.epoch,
            account,
            server,
        }]
    }

    fn click_lock(&mut self, index: usize, now: Instant) {
        if !self.grid_interactive() || self.navigation.is_editing() || index >= self.queue.len() {
            return;
        }
        self.navigation.deselect();
        let boundary = self.queue.set_boundary(index);
        debug!(index, boundary, "lock boundary moved");
        self.persistence.record_edit(now);
    }

    /// Applies `edit` to the item open in the editor. Returns whether it succeeded.
    fn edit_current<F>(&mut self, now: Instant, edit: F) -> bool
    where
        F: FnOnce(&mut ContentQueue, usize) -> Result<(), crate::error::QueueError>,
    {
        let Some(index) = self.navigation.editing() else {
            return false;
        };
        match edit(&mut self.queue, index) {
            Ok(()) => {
                self.persistence.record_edit(now);
                true
            }
            Err(err) => {
                warn!(%err, index, "edit rejected");
                self.status.failure(err.to_string());
                false
            }
        }
    }

    fn upload(&mut self, files: Vec<MediaFile>) -> Vec<Effect> {
        let decision = self.uploads.plan(
            files,
            UploadContext {
                account: self.account.as_ref(),
                saved: self.persistence.is_saved() && !self.loading,
                uploading: self.uploading,
                editing: self.navigation.is_editing(),
                gallery_mode: self.gallery_mode,
            },
        );
        for rejection in &decision.rejections {
            self.status.failure(rejection.to_string());
        }
        let Some(plan) = decision.plan else {
            return Vec::new();
        };
        let (Some(account), Some(server)) = (self.account.clone(), self.server()) else {
            self.refuse("upload", Precondition::NotConnected);
            return Vec::new();
        };

        info!(%account, files = plan.files().len(), bytes = plan.total_bytes(), "starting upload");
        self.uploading = true;
        self.upload_percent = 0.0;
        self.navigation.deselect();
        vec![Effect::Upload {
            epoch: self.epoch,
            account,
            server,
            plan,
        }]
    }

    fn download(&mut self, now: Instant) -> Vec<Effect> {
        if self.account.is_none() {
            self.refuse("download", Precondition::NoAccount);
            return Vec::new();
        }
        if let Some(precondition) = self.busy() {
            self.refuse("download", precondition);
            return Vec::new();
        }

        let selected = self.navigation.selected();
        let lock_after = selected.is_none();
        let Some(index) = selected.or_else(|| self.queue.next_pending_index()) else {
            self.status.failure("No next item available");
            return Vec::new();
        };
        let Some(item) = self.queue.get(index) else {
            self.status.failure("No next item available");
            return Vec::new();
        };

        let request = DownloadRequest {
            index,
            caption: item.caption.clone(),
            urls: item
                .media_addresses()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            lock_after,
        };

        if lock_after {
            self.navigation.deselect();
            self.queue.set_boundary(index);
            self.persistence.record_edit(now);
        }
        vec![Effect::Export(request)]
    }

    fn refetch(&mut self) -> Option<Effect> {
        let account = self.account.clone()?;
        let server = self.server()?;
        self.loading = true;
        Some(Effect::FetchContent {
            epoch: self.epoch,
            account,
            server,
        })
    }

    /// Starts a new epoch with an empty grid. Unsaved edits of the old account
    /// are flushed first when `flush` is set.
    fn leave_account(&mut self, flush: bool) -> Vec<Effect> {
        let effects = if flush { self.flush().into_iter().collect() } else { Vec::new() };
        self.epoch += 1;
        self.account = None;
        self.queue = ContentQueue::default();
        self.navigation.reset();
        self.persistence.reset();
        self.loading = false;
        effects
    }

    fn replace_queue(&mut self, items: &[ContentItem]) {
        let formatted = match &self.connection {
            Some(connection) => connection.codec.format(items),
            None => items.to_vec(),
        };
        self.queue = ContentQueue::new(formatted);
        self.navigation.reset();
        self.persistence.reset();
    }

    fn save_effect(&self) -> Option<Effect> {
        let account = self.account.clone()?;
        let connection = self.connection.as_ref()?;
        info!(%account, revision = self.queue.revision(), "persisting content");
        Some(Effect::SaveContent {
            epoch: self.epoch,
            revision: self.queue.revision(),
            account,
            items: connection.codec.strip(self.queue.items()),
            server: connection.server.clone(),
        })
    }

    fn report_fetch_failure(&mut self, account: &AccountName, err: &BackendError) {
        warn!(%account, %err, "content fetch failed");
        let text = match err {
            BackendError::Malformed(malformed) => format!(
                "Content of \"{account}\" has an unsupported media type at item {}",
                malformed.index
            ),
            other => format!("Could not load content of \"{account}\": {other}"),
        };
        self.status.failure(text);
    }

    fn is_stale(&self, epoch: u64, what: &str) -> bool {
        let stale = epoch != self.epoch;
        if stale {
            debug!(epoch, current = self.epoch, what, "dropping stale completion");
        }
        stale
    }

    fn server(&self) -> Option<BackendAddress> {
        self.connection
            .as_ref()
            .map(|connection| connection.server.clone())
    }

    fn grid_interactive(&self) -> bool {
        self.account.is_some() && !self.uploading && !self.loading
    }

    fn busy(&self) -> Option<Precondition> {
        if self.uploading {
            Some(Precondition::Uploading)
        } else if self.navigation.is_editing() {
            Some(Precondition::Editing)
        } else {
            None
        }
    }

    fn refuse(&mut self, action: &str, precondition: Precondition) {
        debug!(action, ?precondition, "action refused");
        self.status
            .failure(format!("Cannot {action}: {}", precondition.describe()));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
